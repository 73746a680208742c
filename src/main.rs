#![forbid(unsafe_code)]

//! `meeting-bridge`: meeting SDK coordination server binary.
//!
//! Bootstraps configuration, starts the bridge task against the simulated
//! SDK, and serves the IPC channel for `meeting-bridge-ctl` and host
//! processes.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use meeting_bridge::bridge::{self, Bridge, BridgeSettings};
use meeting_bridge::config::GlobalConfig;
use meeting_bridge::ipc::server::spawn_ipc_server;
use meeting_bridge::relay::EventRelay;
use meeting_bridge::sdk::simulated::{SimulatedPermissions, SimulatedSdk};
use meeting_bridge::sdk::MeetingSdk;
use meeting_bridge::state::AppState;
use meeting_bridge::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "meeting-bridge", about = "Meeting SDK coordination server", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the IPC socket name from the configuration.
    #[arg(long)]
    ipc_name: Option<String>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("meeting-bridge bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match args.config {
        Some(ref path) => GlobalConfig::load_from_path(path)?,
        None => {
            info!("no config file given; using defaults");
            GlobalConfig::default()
        }
    };

    if let Some(name) = args.ipc_name {
        config.ipc_name = name;
    }

    config.load_credentials().await?;

    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Start the bridge ────────────────────────────────
    let ct = CancellationToken::new();
    let (handle, inbox) = bridge::channel();
    let callbacks = handle.callback_sink();

    let sdk: Arc<dyn MeetingSdk> = Arc::new(SimulatedSdk::new(
        config.simulator.clone(),
        callbacks.clone(),
    ));
    let permissions = Arc::new(SimulatedPermissions::new(
        &config.simulator,
        callbacks.clone(),
    ));
    let relay = Arc::new(EventRelay::new(Arc::clone(&sdk)));

    let bridge_handle = Bridge::new(
        sdk,
        permissions,
        BridgeSettings::from(config.as_ref()),
        callbacks,
    )
    .spawn(inbox, ct.clone());
    info!("bridge started");

    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        bridge: handle,
        relay: Arc::clone(&relay),
    });

    // ── Start IPC server ────────────────────────────────
    let ipc_handle = spawn_ipc_server(Arc::clone(&state), ct.clone())?;

    info!(ipc_name = %config.ipc_name, "meeting-bridge ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    relay.shutdown().await;

    let (bridge_result, ipc_result) = tokio::join!(bridge_handle, ipc_handle);
    if let Err(err) = bridge_result {
        error!(%err, "bridge task failed");
    }
    if let Err(err) = ipc_result {
        error!(%err, "ipc task failed");
    }
    info!("meeting-bridge shut down");

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
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
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
    let subscriber = fmt().with_env_filter(env_filter);

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
