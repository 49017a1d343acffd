/*!
Test helpers shared by the gateway and portal suites

- Logging init that tolerates being called from every test
- Serving any axum router on an ephemeral local port
*/

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Initialises `env_logger` once; later calls are no-ops.
pub fn init_test_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// Serves `app` on `127.0.0.1:0` in a background task.
///
/// The returned handle should be aborted (or dropped with the owning stub)
/// when the test is done with the server.
pub async fn serve(app: Router) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind test listener")?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("test server stopped: {e}");
        }
    });
    Ok((addr, handle))
}
