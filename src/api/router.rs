use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{AppState, health_check, transport_status};

/// Creates the health router
///
/// - GET /health - Liveness
/// - GET /health/transport - Selected transport mode
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/transport", get(transport_status))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::RecordingTransport;
    use crate::application::messaging::TransportSelector;
    use crate::ports::MessageTransport;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let state = Arc::new(AppState {
            selector: Arc::new(TransportSelector::fallback_only(None)),
        });

        let (status, body) = get_body(create_router(state), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_transport_status_reports_primary_mode() {
        let primary: Arc<dyn MessageTransport> = Arc::new(RecordingTransport::new("amqp"));
        let fallback: Arc<dyn MessageTransport> = Arc::new(RecordingTransport::new("redis"));
        let state = Arc::new(AppState {
            selector: Arc::new(TransportSelector::with_primary(primary, Some(fallback))),
        });

        let (status, body) = get_body(create_router(state), "/health/transport").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["mode"], "primary_active");
        assert_eq!(json["fallback_available"], true);
    }

    #[tokio::test]
    async fn test_transport_status_reports_fallback_only() {
        let state = Arc::new(AppState {
            selector: Arc::new(TransportSelector::fallback_only(None)),
        });

        let (_, body) = get_body(create_router(state), "/health/transport").await;

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["mode"], "fallback_only");
        assert_eq!(json["fallback_available"], false);
    }
}
