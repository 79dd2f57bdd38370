//! Batch command implementation
//!
//! Each configuration gets its own engine and paper venue; engines share
//! nothing but the read-only readings table.

use anyhow::Result;
use futures_strategies::backtest::{Replay, ReplayReport};
use futures_strategies::{data, Config};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info};

struct BatchResult {
    config_path: String,
    report: Result<ReplayReport>,
}

fn run_one(config_path: &str, table: &data::ReadingTable) -> Result<ReplayReport> {
    let config = Config::from_file(config_path)?;
    let engine_config = config.engine_config()?;
    Ok(Replay::new(engine_config).run(table)?)
}

pub fn run(config_paths: Vec<String>, data_path: String, sequential: bool) -> Result<()> {
    info!("Starting batch replay of {} configurations", config_paths.len());
    let table = data::load_readings(&data_path)?;

    println!("\n{}", "=".repeat(60));
    println!("BATCH REPLAY");
    println!("{}", "=".repeat(60));
    println!("  Configurations: {}", config_paths.len());
    println!("  Bars:           {}", table.len());
    println!("  Mode:           {}", if sequential { "sequential" } else { "parallel" });
    println!("{}\n", "=".repeat(60));

    let pb = ProgressBar::new(config_paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("⚡ {percent:>3}%|{bar:40}| {pos}/{len} [{elapsed}<{eta}, {per_sec:.2}] ✓ {msg}")?
            .progress_chars("█░ "),
    );

    let failed = AtomicUsize::new(0);
    let replay_one = |path: &String| {
        let report = run_one(path, &table);
        if let Err(e) = &report {
            error!("Replay of {} failed: {:#}", path, e);
            let count = failed.fetch_add(1, Ordering::Relaxed) + 1;
            pb.set_message(format!("{} failed", count));
        }
        pb.inc(1);
        BatchResult {
            config_path: path.clone(),
            report,
        }
    };

    let results: Vec<BatchResult> = if sequential {
        config_paths.iter().map(replay_one).collect()
    } else {
        config_paths.par_iter().map(replay_one).collect()
    };

    pb.finish_with_message(format!("{} failed", failed.load(Ordering::Relaxed)));
    println!();

    println!("\n{}", "=".repeat(100));
    println!(
        "{:<40} {:<18} {:>8} {:>8} {:>9} {:>12}",
        "Config", "Strategy", "Bars", "Trades", "Win %", "P&L"
    );
    println!("{}", "-".repeat(100));
    for result in &results {
        match &result.report {
            Ok(report) => println!(
                "{:<40} {:<18} {:>8} {:>8} {:>8.2}% {:>12}",
                result.config_path,
                format!("{} {}", report.strategy_name, report.direction.label()),
                report.bars,
                report.round_trips.len(),
                report.win_rate(),
                report.total_pnl().round_dp(2).to_string()
            ),
            Err(e) => println!("{:<40} ❌ {}", result.config_path, e),
        }
    }
    println!("{}", "=".repeat(100));

    Ok(())
}
