//! HTTP console for gatehouse.
//!
//! Server-rendered pages for the local user manager and the captive portal
//! allowed-hostname editor. Authentication is delegated to a front proxy
//! that passes the operator's username in a trusted header.

pub mod error;
pub mod form;
pub mod render;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use tracing::info;

pub use error::WebError;
pub use routes::build_router;
pub use state::AppState;

/// Bind `addr` and serve until ctrl-c.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "gatehouse console listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
