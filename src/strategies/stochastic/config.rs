//! Stochastic crossing configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticConfig {
    /// Stochastic %D series (default: "stoch_d")
    pub stoch_d_series: String,

    /// Trend filter SMA; `null` disables the filter (default: "sma")
    pub filter_series: Option<String>,

    /// Overbought line (default: 80)
    pub upper_line: f64,

    /// Oversold line (default: 20)
    pub lower_line: f64,
}

impl Default for StochasticConfig {
    fn default() -> Self {
        Self {
            stoch_d_series: "stoch_d".to_string(),
            filter_series: Some("sma".to_string()),
            upper_line: 80.0,
            lower_line: 20.0,
        }
    }
}
