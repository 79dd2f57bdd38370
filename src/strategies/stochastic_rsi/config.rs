//! Stochastic RSI configuration

use serde::{Deserialize, Serialize};

/// How %D is compared against the lines on entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// %D crosses back through the line
    Cross,
    /// %D is at or beyond the line
    Level,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticRsiConfig {
    /// Stochastic RSI %D series (default: "stoch_rsi_d")
    pub stoch_d_series: String,

    /// Optional trend filter SMA (default: none)
    pub filter_series: Option<String>,

    pub upper_line: f64,
    pub lower_line: f64,

    pub mode: TriggerMode,

    /// Close on the opposite crossing (default: true). With it off, only the
    /// stop and the take-profit level close the position.
    pub exit_on_cross: bool,
}

impl Default for StochasticRsiConfig {
    fn default() -> Self {
        Self {
            stoch_d_series: "stoch_rsi_d".to_string(),
            filter_series: None,
            upper_line: 80.0,
            lower_line: 20.0,
            mode: TriggerMode::Cross,
            exit_on_cross: true,
        }
    }
}
