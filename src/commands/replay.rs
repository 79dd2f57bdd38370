//! Replay command implementation

use anyhow::Result;
use futures_strategies::backtest::{Replay, ReplayReport};
use futures_strategies::{data, Config};
use tracing::{debug, info};

pub fn run(config_path: String, data_path: String, strategy_override: Option<String>) -> Result<()> {
    info!("Starting replay");

    let mut config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    if let Some(strategy) = strategy_override {
        info!("Overriding strategy to: {}", strategy);
        config.strategy_name = strategy;
    }

    let engine_config = config.engine_config()?;
    debug!("Resolved rules: {:?}", engine_config.rules);

    let table = data::load_readings(&data_path)?;
    let report = Replay::new(engine_config).run(&table)?;

    print_report(&report);
    Ok(())
}

pub fn print_report(report: &ReplayReport) {
    println!("\n{}", "=".repeat(60));
    println!("REPLAY RESULTS");
    println!("{}", "=".repeat(60));
    println!("Strategy:           {} ({})", report.strategy_name, report.direction);
    println!("Bars:               {}", report.bars);
    println!("Total Trades:       {}", report.round_trips.len());
    println!("Winning Trades:     {}", report.winning_trades());
    println!("Losing Trades:      {}", report.losing_trades());
    println!("Stopped Out:        {}", report.stopped_out());
    println!("Win Rate:           {:.2}%", report.win_rate());
    println!("Total P&L:          {}", report.total_pnl().round_dp(2));
    println!("Largest Win:        {}", report.largest_win().round_dp(2));
    println!("Largest Loss:       {}", report.largest_loss().round_dp(2));
    println!("Venue Requests:     {}", report.venue_requests);
    println!("Rejections:         {}", report.rejections.len());
    println!("Final State:        {}", report.final_state.state);
    println!("{}", "=".repeat(60));

    if !report.round_trips.is_empty() {
        println!("\n{:<6} {:>12} {:>12} {:>12}  Exit", "Side", "Entry", "Exit", "P&L");
        println!("{}", "-".repeat(60));
        for trip in &report.round_trips {
            println!(
                "{:<6} {:>12} {:>12} {:>12}  {}",
                trip.direction.label(),
                trip.entry_price.round_dp(2).to_string(),
                trip.exit_price.round_dp(2).to_string(),
                trip.pnl.round_dp(2).to_string(),
                trip.exit_label
            );
        }
    }

    for rejection in &report.rejections {
        println!("⚠️  {}", rejection);
    }
}
