//! Read-only admin HTTP surface (§6): DLQ status/metrics, operator
//! instructions, and the bus cluster health probe.
//!
//! A small state struct threaded through `Router::with_state`, with a
//! `serve` entry point that installs graceful shutdown over
//! `tokio::signal`.

mod handlers;
mod state;

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use tokio::signal;
use tracing::info;

pub use logaggr_bus::core::TOPIC_LOGS_DLQ;
pub use state::AdminState;

/// Assembles the admin router. Split out from [`serve`] so tests can
/// drive it directly with `tower::ServiceExt::oneshot` without binding
/// a socket.
pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/dlq/status", get(handlers::dlq_status))
        .route("/admin/dlq/metrics", get(handlers::dlq_metrics))
        .route("/admin/dlq/info", get(handlers::dlq_info))
        .route("/admin/health", get(handlers::health))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("admin surface: received Ctrl+C, shutting down"),
        _ = terminate => info!("admin surface: received SIGTERM, shutting down"),
    }
}

/// Binds `addr` and serves the admin router until a shutdown signal
/// arrives.
pub async fn serve(state: AdminState, addr: SocketAddr) -> std::io::Result<()> {
    info!(%addr, "admin surface listening");
    axum::Server::bind(&addr)
        .serve(router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tower::ServiceExt;

    use logaggr_bus::core::{BusAdmin, BusError, ClusterHealth};
    use logaggr_metric::{names, Registry};
    use logaggr_time::SystemProvider;

    use super::*;

    #[derive(Debug)]
    struct StubAdmin(ClusterHealth);

    #[async_trait::async_trait]
    impl BusAdmin for StubAdmin {
        async fn describe_cluster(&self, _timeout: Duration) -> Result<ClusterHealth, BusError> {
            Ok(self.0.clone())
        }
    }

    fn state_with(admin: ClusterHealth) -> AdminState {
        AdminState {
            metrics: Registry::default(),
            bus_admin: Arc::new(StubAdmin(admin)),
            clock: Arc::new(SystemProvider::new()),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn dlq_status_reports_current_counter() {
        let state = state_with(ClusterHealth::Up {
            cluster_id: "c1".into(),
            node_count: 3,
        });
        state.metrics.counter(names::LOGS_DLQ_TOTAL).inc(4);

        let response = router(state)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/admin/dlq/status")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["dlqTotal"], 4);
        assert_eq!(body["topic"], TOPIC_LOGS_DLQ);
    }

    #[tokio::test]
    async fn dlq_metrics_flags_warning_on_high_dlq_rate() {
        let state = state_with(ClusterHealth::Up {
            cluster_id: "c1".into(),
            node_count: 3,
        });
        state.metrics.counter(names::LOGS_PUBLISHED_TOTAL).inc(100);
        state.metrics.counter(names::LOGS_CONSUMED_TOTAL).inc(100);
        state.metrics.counter(names::LOGS_DLQ_TOTAL).inc(5);

        let response = router(state)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/admin/dlq/metrics")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["dlqRatePercent"], 5.0);
        assert_eq!(body["consumerLag"], 0);
        assert_eq!(body["healthStatus"], "WARNING");
    }

    #[tokio::test]
    async fn dlq_metrics_is_healthy_with_no_traffic() {
        let state = state_with(ClusterHealth::Up {
            cluster_id: "c1".into(),
            node_count: 3,
        });

        let response = router(state)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/admin/dlq/metrics")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["dlqRatePercent"], 0.0);
        assert_eq!(body["healthStatus"], "HEALTHY");
    }

    #[tokio::test]
    async fn health_reports_cluster_down() {
        let state = state_with(ClusterHealth::Down {
            error_class: "transport".into(),
            message: "connection refused".into(),
        });

        let response = router(state)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/admin/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["status"], "DOWN");
        assert_eq!(body["errorClass"], "transport");
    }

    #[tokio::test]
    async fn dlq_info_lists_operator_instructions() {
        let state = state_with(ClusterHealth::Up {
            cluster_id: "c1".into(),
            node_count: 1,
        });

        let response = router(state)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/admin/dlq/info")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        assert!(body["instructions"].as_array().unwrap().len() >= 2);
    }
}
