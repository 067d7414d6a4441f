//! HTTP query interface for rlog
//!
//! Serves matching records as plain text or structured JSON, and lets
//! clients rebuild the file summary index.

mod error;
mod handlers;
mod routes;
mod state;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

pub use error::{WebError, WebResult};
pub use handlers::{LogParams, LogsResponse, RebuildResponse};
pub use routes::create_router;
pub use state::WebState;

/// Serve the query interface until `shutdown` completes.
pub async fn serve<F>(state: Arc<WebState>, addr: SocketAddr, shutdown: F) -> WebResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| WebError::BindFailed(addr, e))?;

    tracing::info!(addr = %addr, "web interface listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| WebError::Internal(e.to_string()))?;

    tracing::info!("web interface shut down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlog_engine::Session;

    #[tokio::test]
    async fn test_serve_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();
        let state = Arc::new(WebState::new(Session::default()));

        let result = serve(state, addr, async {}).await;
        assert!(matches!(result, Err(WebError::BindFailed(_, _))));
    }

    #[tokio::test]
    async fn test_serve_with_shutdown() {
        let state = Arc::new(WebState::new(Session::default()));
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();

        let result = serve(state, addr, async {}).await;
        assert!(result.is_ok());
    }
}
