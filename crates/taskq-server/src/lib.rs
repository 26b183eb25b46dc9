//! taskq-server: HTTP transport and process wiring for taskq-core.

pub mod config;
pub mod routes;

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use taskq_core::App;

pub use config::ServerConfig;
pub use routes::task_routes;

/// Serve the task endpoints on `listener` until `shutdown` resolves.
///
/// Only stops the HTTP side; the caller shuts the pool down afterwards so no
/// request can submit into a closing pool.
pub async fn serve(
    listener: TcpListener,
    app: Arc<App>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "server started");

    axum::serve(listener, task_routes(app))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!(%addr, "server stopped");
    Ok(())
}
