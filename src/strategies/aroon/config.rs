//! Aroon sustained-trend configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AroonConfig {
    #[serde(default = "default_aroon_up_series")]
    pub aroon_up_series: String,

    #[serde(default = "default_aroon_down_series")]
    pub aroon_down_series: String,

    /// Trend line level that must hold for the whole window (default: 80)
    #[serde(default = "default_level")]
    pub level: f64,

    /// Completed bars the trend line must stay at or above `level` (default: 3)
    #[serde(default = "default_window")]
    pub window: usize,

    /// Opposite line must be at or below this on the entry bar (default: 30)
    #[serde(default = "default_opposite_max")]
    pub opposite_max: Option<f64>,

    /// Close when the opposite line crosses up through this (default: 30)
    #[serde(default = "default_exit_level")]
    pub exit_level: f64,
}

fn default_aroon_up_series() -> String {
    "aroon_up".to_string()
}
fn default_aroon_down_series() -> String {
    "aroon_down".to_string()
}
fn default_level() -> f64 {
    80.0
}
fn default_window() -> usize {
    3
}
fn default_opposite_max() -> Option<f64> {
    Some(30.0)
}
fn default_exit_level() -> f64 {
    30.0
}

impl Default for AroonConfig {
    fn default() -> Self {
        Self {
            aroon_up_series: default_aroon_up_series(),
            aroon_down_series: default_aroon_down_series(),
            level: default_level(),
            window: default_window(),
            opposite_max: default_opposite_max(),
            exit_level: default_exit_level(),
        }
    }
}
