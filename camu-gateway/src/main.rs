/**
 * CAMU GATEWAY - entry point of the relay server
 *
 * Loads .env + gateway.yaml, builds the upstream relay and serves the
 * /api/proxy router until the process is stopped.
 */

use anyhow::Context;
use camu_gateway::{build_router, load_config, AppState, UpstreamRelay};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("camu_gateway=info")),
        )
        .init();

    let cfg = load_config().await;
    info!("relaying to {}", cfg.upstream.base_url);

    let app_state = AppState::new(UpstreamRelay::new(cfg.upstream.clone()));
    let app = build_router(app_state);

    let listener = TcpListener::bind(&cfg.listen)
        .await
        .with_context(|| format!("failed to bind {}", cfg.listen))?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await.context("server stopped")?;
    Ok(())
}
