//! Check command implementation

use anyhow::{Context, Result};
use futures_strategies::Config;
use tracing::info;

pub fn run(config_path: String) -> Result<()> {
    let config = Config::from_file(&config_path)?;
    let engine_config = config
        .engine_config()
        .with_context(|| format!("Invalid configuration {}", config_path))?;
    info!("✓ Configuration valid: {}", config_path);

    let params = &engine_config.params;
    println!("\n{}", "=".repeat(60));
    println!("CONFIGURATION");
    println!("{}", "=".repeat(60));
    println!("Strategy:           {}", engine_config.strategy_name);
    println!("Direction:          {}", engine_config.direction());
    println!("Symbol:             {}", params.symbol);
    println!("Tick Size:          {}", params.tick_size);
    println!("Point Value:        {}", params.point_value);
    println!("Quantity:           {}", params.quantity);
    if let Some(amount) = params.stop_loss_amount {
        println!("Stop Loss:          {}", amount);
    }
    if let Some(pct) = params.stop_loss_pct {
        println!("Stop Loss:          {:.2}%", pct);
    }
    if let Some(amount) = params.take_profit_amount {
        println!("Take Profit:        {}", amount);
    }
    if let Some(pct) = params.breakeven_trigger_pct {
        println!(
            "Breakeven:          {:.2}% (+{} ticks)",
            pct, params.breakeven_offset_ticks
        );
    }
    println!("Series:             {}", engine_config.rules.required_series().join(", "));
    println!("{}", "=".repeat(60));

    println!("\n{}", serde_json::to_string_pretty(&engine_config.rules)?);
    Ok(())
}
