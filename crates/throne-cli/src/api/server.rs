use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use throne_core::ProviderGateway;
use tokio::net::TcpListener;
use tracing::info;

use super::routes::create_router;

/// Bind `addr` and serve until Ctrl-C.
pub async fn start_server(gateway: Arc<ProviderGateway>, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Throne Room API listening on http://{}", listener.local_addr()?);

    serve(listener, gateway, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    gateway: Arc<ProviderGateway>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router().with_state(gateway);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down API server...");
}
