use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use slide_api::GoSlideCloud;
use tokio::net::TcpListener;

use crate::app::create_app;
use crate::configs::Settings;
use crate::context::{IntegrationContext, IntegrationOptions};

pub mod app;
pub mod configs;
pub mod context;
pub mod entities;
pub mod errors;
pub mod handles;
pub mod models;
pub mod services;

pub async fn run(settings: &Arc<Settings>) -> anyhow::Result<()> {
    let gateway = Arc::new(GoSlideCloud::new(settings.cloud_config())?);

    let context = Arc::new(
        IntegrationContext::setup(gateway, IntegrationOptions::from(settings.as_ref())).await?,
    );
    context.start().await;

    let app = create_app(context.clone());

    let ip_addr = settings
        .server
        .host
        .parse::<IpAddr>()
        .with_context(|| format!("Invalid server host {}", settings.server.host))?;

    let address = SocketAddr::from((ip_addr, settings.server.port));

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    tracing::info!("listening on {:?}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    context.unload().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}
