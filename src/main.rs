//! Futures strategies - main entry point
//!
//! This binary provides four subcommands:
//! - replay: Replay one configuration over precomputed readings
//! - batch: Replay several configurations in parallel
//! - check: Validate a configuration and print the resolved rules
//! - strategies: List the registered strategy presets

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "futures-strategies")]
#[command(about = "Bar-driven futures strategies with replay and configuration checks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay one configuration over a readings CSV
    Replay {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/macd_short.json")]
        config: String,

        /// Path to the readings CSV (datetime, close, series...)
        #[arg(short, long)]
        data: String,

        /// Strategy name (overrides config file)
        #[arg(short, long)]
        strategy: Option<String>,
    },

    /// Replay several configurations over the same readings in parallel
    Batch {
        /// Configuration files (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        configs: Vec<String>,

        /// Path to the readings CSV
        #[arg(short, long)]
        data: String,

        /// Run sequentially instead of parallel
        #[arg(long)]
        sequential: bool,
    },

    /// Validate a configuration file
    Check {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/macd_short.json")]
        config: String,
    },

    /// List registered strategy presets
    Strategies,
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    if file_only {
        // Batch: only log to file, keep console clean for progress bar
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        // File layer - same format but without ANSI colors
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    // RUST_LOG may come from a local .env
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let (command_name, file_only) = match &cli.command {
        Commands::Replay { .. } => ("replay", false),
        Commands::Batch { .. } => ("batch", true), // File-only for clean progress bar
        Commands::Check { .. } => ("check", false),
        Commands::Strategies => ("strategies", false),
    };

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Replay {
            config,
            data,
            strategy,
        } => commands::replay::run(config, data, strategy),

        Commands::Batch {
            configs,
            data,
            sequential,
        } => commands::batch::run(configs, data, sequential),

        Commands::Check { config } => commands::check::run(config),

        Commands::Strategies => commands::strategies::run(),
    }
}
