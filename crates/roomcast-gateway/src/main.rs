//! roomcast gateway binary.
//!
//! - Config from `$ROOMCAST_CONFIG` (default `roomcast.yaml`); built-in
//!   defaults when the default file is absent
//! - Idle session sweeper
//! - Graceful shutdown on Ctrl-C: drain, cancel connections, stop serving

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use roomcast_core::error::{Result, RoomcastError};
use roomcast_gateway::{app_state::AppState, config, router};

const DEFAULT_CONFIG: &str = "roomcast.yaml";

fn load_config() -> Result<config::GatewayConfig> {
    match std::env::var("ROOMCAST_CONFIG") {
        Ok(path) => config::load_from_file(&path),
        Err(_) if Path::new(DEFAULT_CONFIG).exists() => config::load_from_file(DEFAULT_CONFIG),
        Err(_) => {
            tracing::info!("no {DEFAULT_CONFIG} found, using defaults");
            Ok(config::GatewayConfig::default())
        }
    }
}

async fn run() -> Result<()> {
    let cfg = load_config()?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| RoomcastError::BadRequest(format!("gateway.listen: {e}")))?;

    let state = AppState::new(cfg)?;
    let sweeper = state.spawn_sweeper();
    let app = router::build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| RoomcastError::Internal(format!("bind {listen} failed: {e}")))?;
    tracing::info!(%listen, "roomcast-gateway starting");

    let drain = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "ctrl-c handler failed, graceful shutdown disabled");
                std::future::pending::<()>().await;
            }
            drain.begin_drain();
        })
        .await
        .map_err(|e| RoomcastError::Internal(format!("server failed: {e}")))?;

    let _ = sweeper.await;
    tracing::info!("roomcast-gateway stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.client_code().as_str(), "fatal");
            ExitCode::FAILURE
        }
    }
}
