//! MACD configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacdConfig {
    /// MACD line series (default: "macd")
    #[serde(default = "default_macd_series")]
    pub macd_series: String,

    /// Signal line series (default: "macd_signal")
    #[serde(default = "default_signal_series")]
    pub signal_series: String,

    /// Trend filter SMA (default: "sma")
    #[serde(default = "default_filter_series")]
    pub filter_series: String,

    /// Also close on the opposite MACD crossing (default: true)
    #[serde(default = "default_exit_on_cross")]
    pub exit_on_cross: bool,
}

fn default_macd_series() -> String {
    "macd".to_string()
}
fn default_signal_series() -> String {
    "macd_signal".to_string()
}
fn default_filter_series() -> String {
    "sma".to_string()
}
fn default_exit_on_cross() -> bool {
    true
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            macd_series: default_macd_series(),
            signal_series: default_signal_series(),
            filter_series: default_filter_series(),
            exit_on_cross: default_exit_on_cross(),
        }
    }
}
