//! Aroon + Stochastic configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AroonStochasticConfig {
    /// Slow SMA the close must be above (long) or below (short) (default: "sma")
    #[serde(default = "default_filter_series")]
    pub filter_series: String,

    #[serde(default = "default_aroon_up_series")]
    pub aroon_up_series: String,

    #[serde(default = "default_aroon_down_series")]
    pub aroon_down_series: String,

    #[serde(default = "default_stoch_d_series")]
    pub stoch_d_series: String,

    /// Aroon line in the trade direction must be at least this (default: 75)
    #[serde(default = "default_aroon_level")]
    pub aroon_level: f64,

    /// Stochastic %D must be above this for a long (default: 70)
    #[serde(default = "default_upper_line")]
    pub upper_line: f64,

    /// Stochastic %D must be below this for a short (default: 30)
    #[serde(default = "default_lower_line")]
    pub lower_line: f64,
}

fn default_filter_series() -> String {
    "sma".to_string()
}
fn default_aroon_up_series() -> String {
    "aroon_up".to_string()
}
fn default_aroon_down_series() -> String {
    "aroon_down".to_string()
}
fn default_stoch_d_series() -> String {
    "stoch_d".to_string()
}
fn default_aroon_level() -> f64 {
    75.0
}
fn default_upper_line() -> f64 {
    70.0
}
fn default_lower_line() -> f64 {
    30.0
}

impl Default for AroonStochasticConfig {
    fn default() -> Self {
        Self {
            filter_series: default_filter_series(),
            aroon_up_series: default_aroon_up_series(),
            aroon_down_series: default_aroon_down_series(),
            stoch_d_series: default_stoch_d_series(),
            aroon_level: default_aroon_level(),
            upper_line: default_upper_line(),
            lower_line: default_lower_line(),
        }
    }
}
