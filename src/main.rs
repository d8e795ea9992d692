//! gated-server binary.
//!
//! Startup order:
//! 1. Load configuration, initialize logging (and metrics if enabled)
//! 2. Create the readiness gate held, start initialization on its own task
//! 3. Subscribe to OS signals
//! 4. Bind and start serving (bind failure aborts the process)
//! 5. Hand the server to the lifecycle controller and wait for its report

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::sync::oneshot;

use gated_server::config::{load_config, ServerConfig};
use gated_server::http::{AppState, HttpServer};
use gated_server::lifecycle::{
    signals, startup, LifecycleController, ProcessRespawner, ReadinessGate,
};
use gated_server::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "gated-server", version)]
#[command(about = "HTTP server with startup gating and graceful signal-driven shutdown")]
struct Cli {
    /// Path to a TOML configuration file. Passed through the environment so
    /// that a process started on SIGHUP picks it up too.
    #[arg(short, long, env = "GATED_SERVER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        "gated-server starting"
    );
    tracing::info!(
        config_file = ?cli.config,
        bind_address = %config.listener.bind_address,
        drain_timeout_secs = config.shutdown.drain_timeout_secs,
        warmup_ms = config.startup.warmup_ms,
        respawn_on_hangup = config.reload.respawn_on_hangup,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (gate, init_guard) = ReadinessGate::begin_init();
    let startup_config = config.startup.clone();
    startup::spawn_initialization(init_guard, move || startup::warm_up(startup_config));

    let signals = signals::subscribe_all()?;

    let server = match HttpServer::bind(&config.listener, AppState::new(gate)).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start listener");
            return Err(e.into());
        }
    };
    let handle = server.start();

    let respawner = config
        .reload
        .respawn_on_hangup
        .then(|| ProcessRespawner::new(config.reload.executable.clone()));
    let controller = LifecycleController::new(config.shutdown.drain_timeout(), respawner);

    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(controller.run(signals, handle, done_tx));

    match done_rx.await {
        Ok(report) => {
            tracing::info!(
                signal = %report.trigger,
                outcome = report.outcome.label(),
                abandoned = report.outcome.abandoned,
                respawned_pid = report.respawned.as_ref().and_then(|r| r.as_ref().ok()).copied(),
                "Shutdown complete"
            );
            Ok(())
        }
        Err(_) => {
            tracing::error!("Lifecycle controller exited without reporting");
            Err("lifecycle controller failed".into())
        }
    }
}
