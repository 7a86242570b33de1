// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! nomad: the multi-status dispatcher's command-line entry point
//! (spec.md §6 "CLI surface").

mod cli;
mod wiring;

use clap::Parser;
use cli::{Cli, Mode};
use nomad_board::{BoardClient, HttpTransport};
use nomad_config::{FileDefaults, NomadConfig, ProcessEnv};
use nomad_core::SystemClock;
use nomad_dispatcher::CycleReport;
use nomad_retry::BackoffConfig;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

/// Runs the requested mode and returns the process exit code, so the
/// decision of *whether* to exit stays out of the testable logic below.
async fn run(cli: Cli) -> anyhow::Result<i32> {
    if let Some(dir) = &cli.working_dir {
        std::env::set_current_dir(dir).map_err(|e| anyhow::anyhow!("cannot change to directory '{}': {e}", dir.display()))?;
    }

    if cli.config_help {
        println!("{}", nomad_config::config_help_text());
        return Ok(0);
    }
    if cli.config_create {
        config_create()?;
        return Ok(0);
    }
    if cli.config_status {
        let config = load_config()?;
        println!("{}", config.status_report());
        return Ok(0);
    }
    if cli.health_check {
        return health_check().await;
    }

    let mode = cli.mode().map_err(anyhow::Error::msg)?;
    let config = load_config()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    install_shutdown_signal_handler(shutdown.clone());
    let shutting_down: Arc<dyn Fn() -> bool + Send + Sync> = {
        let shutdown = shutdown.clone();
        Arc::new(move || shutdown.load(Ordering::Relaxed))
    };

    let dispatcher = wiring::build_dispatcher(&config, shutting_down)?;

    match mode {
        Mode::Continuous => {
            info!("starting continuous polling mode");
            dispatcher.run_continuous().await;
            Ok(0)
        }
        Mode::Refine => Ok(report_exit_code(dispatcher.run_refine_only().await)),
        Mode::Prepare => Ok(report_exit_code(dispatcher.run_prepare_only().await)),
        Mode::Queued => Ok(report_exit_code(dispatcher.run_queued_only().await)),
        Mode::Multi => Ok(report_exit_code(dispatcher.run_cycle().await)),
    }
}

/// Exit code per spec.md §7: nonzero iff zero successes and at least one failure.
fn report_exit_code(report: CycleReport) -> i32 {
    info!(successes = report.successes, failures = report.failures, "one-shot pass complete");
    i32::from(report.is_failure())
}

fn load_config() -> anyhow::Result<NomadConfig> {
    let toml_path = PathBuf::from("nomad.toml");
    let file_path = toml_path.exists().then_some(toml_path);
    NomadConfig::load(&ProcessEnv, file_path.as_deref()).map_err(anyhow::Error::from)
}

fn config_create() -> anyhow::Result<()> {
    let path = PathBuf::from("nomad.toml");
    if path.exists() {
        anyhow::bail!("{} already exists; remove it first", path.display());
    }
    std::fs::write(&path, FileDefaults::default().to_toml_string())?;
    println!("wrote {}", path.display());
    Ok(())
}

async fn health_check() -> anyhow::Result<i32> {
    let config = load_config()?;
    let clock = Arc::new(SystemClock);
    let transport = HttpTransport::new("https://api.notion.com/v1", &config.notion_token, config.board_http_timeout)?;
    let board = BoardClient::new(transport, &config.notion_board_db, BackoffConfig { max_retries: config.max_retries }, clock);

    println!("config: ok");
    match board.retrieve_schema().await {
        Ok(_) => {
            println!("board connection: ok");
            Ok(0)
        }
        Err(e) => {
            println!("board connection: FAILED ({e})");
            Ok(1)
        }
    }
}

/// Handle SIGINT/SIGTERM by flipping `shutdown`, so `run_continuous`'s
/// shutdown-polling loop exits gracefully instead of the process dying mid-cycle.
fn install_shutdown_signal_handler(shutdown: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
        info!("shutdown requested, finishing current cycle");
        shutdown.store(true, Ordering::Relaxed);
    });
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
