//! HTTP endpoint serving the registry to scrapers.
//!
//! - `/metrics` : `<name> <value>` per line, text exposition content type
//!
//! The server owns its own tokio runtime on a dedicated thread, so the
//! collector loop can stay a plain blocking loop on the main thread.

use crate::error::Error;
use crate::registry::Registry;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .with_state(registry)
}

async fn metrics(State(registry): State<Arc<Registry>>) -> Response {
    tracing::trace!("scrape");
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        registry.render(),
    )
        .into_response()
}

/// Handle to the running server thread. Never joined by the agent.
pub struct ExpositionServer {
    local_addr: SocketAddr,
    thread: JoinHandle<()>,
}

impl ExpositionServer {
    /// The address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// False once the serve loop has exited
    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }
}

/// Bind `addr` and start serving `registry` on a new thread.
///
/// Every failure here happens before the thread is running and is returned to
/// the caller; a failure of the serve loop afterwards is only logged.
pub fn spawn(registry: Arc<Registry>, addr: SocketAddr) -> Result<ExpositionServer, Error> {
    let bind_err = |source| Error::Bind { addr, source };

    let listener = TcpListener::bind(addr).map_err(bind_err)?;
    listener.set_nonblocking(true).map_err(bind_err)?;
    let local_addr = listener.local_addr().map_err(bind_err)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("exposition-worker")
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;

    let app = router(registry);
    let thread = thread::Builder::new()
        .name("exposition".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to register metrics listener");
                        return;
                    }
                };
                tracing::info!(addr = %local_addr, "serving /metrics");
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!(error = %e, "metrics server stopped");
                }
            });
        })
        .map_err(Error::Spawn)?;

    Ok(ExpositionServer { local_addr, thread })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Metric;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn metrics_returns_rendered_registry() {
        let registry = Arc::new(Registry::new().unwrap());
        registry.set(Metric::CpuUsage, 37.5);
        registry.set(Metric::ProcessCount, 212.0);

        let response = router(Arc::clone(&registry))
            .oneshot(get("/metrics"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], CONTENT_TYPE);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(body, registry.render());
        assert!(body.contains("cpu_usage 37.5\n"));
        assert!(body.contains("process_count 212\n"));
    }

    #[tokio::test]
    async fn scraping_does_not_modify_registry() {
        let registry = Arc::new(Registry::new().unwrap());
        registry.set(Metric::NetworkRx, 5.0);
        let before = registry.render();

        for _ in 0..3 {
            let response = router(Arc::clone(&registry))
                .oneshot(get("/metrics"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(registry.render(), before);
    }

    #[tokio::test]
    async fn other_paths_are_not_found() {
        let registry = Arc::new(Registry::new().unwrap());
        let response = router(registry).oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn spawn_reports_bind_conflict() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();

        let err = spawn(Arc::new(Registry::new().unwrap()), addr).err().unwrap();
        assert!(matches!(err, Error::Bind { addr: a, .. } if a == addr));
    }

    #[test]
    fn spawn_resolves_ephemeral_port() {
        let server = spawn(Arc::new(Registry::new().unwrap()), "127.0.0.1:0".parse().unwrap()).unwrap();
        assert_ne!(server.local_addr().port(), 0);
        assert!(server.is_running());
    }
}
