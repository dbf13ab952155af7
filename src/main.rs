#![forbid(unsafe_code)]

//! `board-loader`: drives the board-loading workflows from a terminal.
//!
//! Reads one trigger per line from stdin (`flash`, `load`, `run`, `debug`,
//! `reset`, `status`, `quit`) and runs it against a single long-lived
//! session. Tool output and step messages go to stdout; logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use board_loader::config::LoaderConfig;
use board_loader::console::{ConsoleSink, StdoutConsole};
use board_loader::host;
use board_loader::orchestrator::{Collaborators, WorkflowEngine};
use board_loader::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "board-loader", about = "Build, flash and debug STM32F4 projects", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file; built-in defaults apply without it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the project root from the configuration.
    #[arg(long)]
    project_root: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("board-loader bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match &args.config {
        Some(path) => LoaderConfig::load_from_path(path)?,
        None => LoaderConfig::from_toml_str("")?,
    };

    if let Some(root) = args.project_root {
        config.project.root = root;
        config.validate()?;
    }

    let config = Arc::new(config);
    info!(root = %config.project.root.display(), board = config.board, "configuration loaded");

    // ── Build the engine ────────────────────────────────
    let console: Arc<dyn ConsoleSink> = Arc::new(StdoutConsole);
    let engine = WorkflowEngine::new(
        Arc::clone(&config),
        Collaborators::standard(&config, Arc::clone(&console)),
    );

    if !engine.is_board_project() {
        return Err(AppError::Config(format!(
            "project switches {:?} do not target {}",
            config.project.switches, config.board
        )));
    }

    // ── Serve commands ──────────────────────────────────
    let stdin = BufReader::new(tokio::io::stdin());
    host::serve(&engine, console.as_ref(), stdin, shutdown_signal()).await?;

    info!("board-loader shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
