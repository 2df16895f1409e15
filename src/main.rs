//! Vitals - live host telemetry from the terminal
//!
//! Samples memory, CPU utilization, and the running-process count on a
//! fixed interval and prints a formatted report each cycle.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vitals::config::Config;
use vitals::metrics::SnapshotStore;
use vitals::report;
use vitals::sampler::Sampler;

#[derive(Parser)]
#[command(name = "vitals")]
#[command(author = "Vitals Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Live host telemetry sampler", long_about = None)]
struct Cli {
    /// Sampling interval in milliseconds (overrides the config file)
    #[arg(short, long, value_name = "MS")]
    interval: Option<u64>,

    /// Stop after printing this many reports (default: run until Ctrl-C)
    #[arg(short = 'n', long, value_name = "COUNT")]
    count: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn setup_logging(verbosity: u8) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vitals")
        .join("logs");

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "vitals.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive for the duration of the program
    let _logging_guard = setup_logging(cli.verbose)?;

    let config_path = cli.config.or_else(|| {
        let default_config = Config::default_path()?;
        default_config.exists().then_some(default_config)
    });

    let mut config = if let Some(path) = config_path {
        Config::load(&path)?
    } else {
        Config::default()
    };

    if let Some(interval_ms) = cli.interval {
        config.sampler.interval_ms = interval_ms;
    }

    let interval = config.sampler.interval();
    let store = SnapshotStore::new();
    let handle = Sampler::new(store.clone(), interval).spawn();
    info!("vitals started, sampling every {:?}", interval);

    let mut printed = 0u64;
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                println!("--- {} ---", chrono::Local::now().format("%H:%M:%S"));
                print!("{}", report::render(&store.current()));
                printed += 1;
                if cli.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    info!("vitals stopped");
    Ok(())
}
