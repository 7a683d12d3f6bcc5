//! SecureScape server binary.
//!
//! Loads `~/.securescape/config.toml`, opens and seeds the demo database,
//! then serves the attack and secure route families until Ctrl-C.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use securescape::{AppState, build_router};
use securescape_config::SecureScapeConfig;

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(env_filter)
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let settings = SecureScapeConfig::load()
        .context("loading configuration")?
        .unwrap_or_default()
        .resolve()
        .context("resolving configuration")?;
    tracing::info!(
        bind = %settings.bind,
        victim = %settings.victim,
        database = ?settings.database,
        "Configuration loaded"
    );

    let state = AppState::from_settings(&settings)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("binding {}", settings.bind))?;
    tracing::info!(addr = %settings.bind, "SecureScape listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server failed")?;
    Ok(())
}
