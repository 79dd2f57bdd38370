//! Futures Strategies
//!
//! A bar-driven trading decision core for a single position on one futures
//! instrument: signal rules over precomputed indicator readings, a stop and
//! target level calculator, and an order lifecycle that keeps every open
//! position protected by exactly one stop order.

pub mod backtest;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod events;
pub mod indicators;
pub mod oms;
pub mod risk;
pub mod signal;
pub mod strategies;
pub mod types;

pub use config::{Config, EngineConfig, EngineParams};
pub use engine::{BarOutcome, EngineSnapshot, StrategyEngine};
pub use error::{ConfigError, EngineError, EngineResult, RiskError, VenueError};
pub use types::*;
