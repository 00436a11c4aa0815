use anyhow::{Context, Result};
use clap::Parser;
use smsledger_cli::config::{Config, default_config_path, init_config, load_config};
use smsledger_cli::{SignalSleeper, process_all, run_daemon};
use smsledger_core::SystemClock;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "smsledger",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SMSLEDGER_BUILD_SHA"), ")"),
    about = "Append bank SMS transactions to a markdown ledger"
)]
struct Cli {
    /// Stay running and process once a day at the scheduled time (default 23:59)
    #[arg(long)]
    daemon: bool,

    /// Config file (defaults to config.json next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the rows that would be added instead of writing the ledger
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Write a default config file to the config path and exit
    #[arg(long, default_value_t = false)]
    init_config: bool,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    info!(build = env!("SMSLEDGER_BUILD_SHA"), "smsledger {}", env!("CARGO_PKG_VERSION"));

    if cli.init_config {
        return match write_default_config(cli.config.as_deref()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{e:#}");
                ExitCode::FAILURE
            }
        };
    }

    if cli.daemon {
        info!("Starting in daemon mode...");
        return match daemon(&cli).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Error in daemon mode: {e:#}");
                ExitCode::from(1)
            }
        };
    }

    // One-shot: failures are reported but do not change the exit status.
    if let Err(e) = run_pass(cli.config.as_deref(), cli.dry_run) {
        error!("Error during processing: {e:#}");
    }
    ExitCode::SUCCESS
}

fn write_default_config(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    init_config(&path)
}

fn check_sms_command(cfg: &Config) {
    if which::which(&cfg.sms_command).is_err() {
        warn!(
            "{} not found on PATH (is Termux:API installed?); set sms_command in the config",
            cfg.sms_command
        );
    }
}

fn run_pass(config_path: Option<&Path>, dry_run: bool) -> Result<()> {
    let cfg = load_config(config_path);
    check_sms_command(&cfg);
    let summary = process_all(&cfg, &cfg.message_source(), dry_run)?;
    info!(
        fetched = summary.fetched,
        extracted = summary.extracted,
        skipped = summary.skipped,
        added = summary.added,
        "pass finished"
    );
    Ok(())
}

async fn daemon(cli: &Cli) -> Result<()> {
    // Schedule is fixed at startup; the rest of the config is re-read every pass.
    let startup = load_config(cli.config.as_deref());
    let schedule = startup.daily_schedule()?;
    let clock = SystemClock::from_timezone(startup.timezone()?);
    let mut sleeper = SignalSleeper::new();

    run_daemon(&clock, &mut sleeper, schedule, || {
        let cfg = load_config(cli.config.as_deref());
        check_sms_command(&cfg);
        process_all(&cfg, &cfg.message_source(), cli.dry_run).context("processing pass")
    })
    .await
}
