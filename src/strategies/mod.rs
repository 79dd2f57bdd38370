//! Strategy presets
//!
//! Each preset family turns its own typed parameters into [`SignalRules`] for
//! one direction. Presets are looked up by name from a registry, so a config
//! file only has to say `"strategy_name": "macd"`.

pub mod aroon;
pub mod aroon_stochastic;
pub mod custom;
pub mod macd;
pub mod moving_average;
pub mod stochastic;
pub mod stochastic_rsi;

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::error::ConfigError;
use crate::signal::SignalRules;
use crate::Direction;

/// Name of the preset that takes explicit rules
pub const CUSTOM: &str = "custom";

// =============================================================================
// Rules Factory - Type alias for preset constructor functions
// =============================================================================

/// Factory function type for building rules from preset parameters
pub type RulesFactory = fn(&serde_json::Value, Direction) -> Result<SignalRules, ConfigError>;

// =============================================================================
// Preset Registry
// =============================================================================

static REGISTRY: OnceLock<RwLock<HashMap<&'static str, RulesFactory>>> = OnceLock::new();

fn get_registry() -> &'static RwLock<HashMap<&'static str, RulesFactory>> {
    REGISTRY.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert(aroon::NAME, aroon::create as RulesFactory);
        map.insert(aroon_stochastic::NAME, aroon_stochastic::create as RulesFactory);
        map.insert(macd::NAME, macd::create as RulesFactory);
        map.insert(moving_average::NAME, moving_average::create as RulesFactory);
        map.insert(stochastic::NAME, stochastic::create as RulesFactory);
        map.insert(stochastic_rsi::NAME, stochastic_rsi::create as RulesFactory);
        map.insert(CUSTOM, custom::create as RulesFactory);
        RwLock::new(map)
    })
}

/// Build signal rules for the named preset
pub fn create_rules(
    name: &str,
    params: &serde_json::Value,
    direction: Direction,
) -> Result<SignalRules, ConfigError> {
    let factory = {
        let registry = get_registry().read().unwrap_or_else(PoisonError::into_inner);
        registry.get(name).copied()
    };
    let factory = factory.ok_or_else(|| ConfigError::UnknownStrategy {
        name: name.to_string(),
        available: available_strategies().join(", "),
    })?;

    let rules = factory(params, direction)?;
    tracing::debug!(strategy = name, %direction, "Resolved strategy rules");
    Ok(rules)
}

/// Get sorted list of preset names
pub fn available_strategies() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = get_registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .copied()
        .collect();
    names.sort_unstable();
    names
}

/// Register a new preset (for plugins or testing)
pub fn register_strategy(name: &'static str, factory: RulesFactory) {
    get_registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name, factory);
}

/// Parse preset parameters; `null` means all defaults
pub(crate) fn parse_params<T>(name: &str, params: &serde_json::Value) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params.clone()).map_err(|e| ConfigError::InvalidStrategyParams {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
