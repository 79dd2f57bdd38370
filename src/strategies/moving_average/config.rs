//! Moving average configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageMode {
    /// Fast average crosses the slow one; closed on the opposite crossing
    Crossing,
    /// Long, slow and fast averages stacked in trend order; closed when the
    /// close returns through the slow average
    Stacked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingAverageConfig {
    pub mode: AverageMode,
    /// Fast average (default: "sma_fast")
    pub fast_series: String,
    /// Slow average (default: "sma_slow")
    pub slow_series: String,
    /// Long-term average; required for stacked mode, optional filter in
    /// crossing mode (default: "sma_long")
    pub long_series: Option<String>,
}

impl Default for MovingAverageConfig {
    fn default() -> Self {
        Self {
            mode: AverageMode::Stacked,
            fast_series: "sma_fast".to_string(),
            slow_series: "sma_slow".to_string(),
            long_series: Some("sma_long".to_string()),
        }
    }
}
