//! modelwatch server
//!
//! - `POST /predict`, `GET /`, `GET /health`, `GET /metrics`
//! - Config: `$MODELWATCH_CONFIG` (default `modelwatch.yaml`, defaults if absent)
//! - Host sampler runs for the life of the process and is stopped after the
//!   server drains on SIGINT/SIGTERM

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use modelwatch_core::error::{ModelWatchError, Result};
use modelwatch_server::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "modelwatch-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::var("MODELWATCH_CONFIG").unwrap_or_else(|_| "modelwatch.yaml".into());
    let cfg = config::load_or_default(&path)?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| ModelWatchError::Config(format!("server.listen: {e}")))?;

    let state = app_state::AppState::new(cfg)?;
    state.sampler().start().await;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, "modelwatch-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ModelWatchError::Internal(format!("bind {listen} failed: {e}")))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    state.sampler().stop().await;
    tracing::info!("modelwatch-server stopped");
    served.map_err(|e| ModelWatchError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
