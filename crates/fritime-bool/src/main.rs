use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::aggregate::UpstreamClient;
use crate::config::Config;
use crate::types::ServiceState;

mod aggregate;
mod config;
mod server;
mod term;
#[cfg(test)]
mod testing;
mod types;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fritime_bool=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Using timetable service at {} (timeout {:?}, max {} concurrent fetches)",
        config.upstream_url, config.upstream_timeout, config.max_concurrent_fetches
    );

    let upstream = UpstreamClient::from_config(&config)?;
    let app_state = Arc::new(ServiceState { upstream });
    let app = server::create_router(app_state, server::cors_layer(&config.cors_allowed_origins));

    let address = format!("{}:{}", config.app_host, config.app_port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!("Server started on http://{address}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
