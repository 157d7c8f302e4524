//! Unified API router for termbridge
//!
//! Merges all module routers into a single axum `Router` with CORS.
//!
//! ## Endpoint Map
//!
//! | Prefix                 | Module   | Description                        |
//! |------------------------|----------|------------------------------------|
//! | `/health`              | gateway  | Liveness probe                     |
//! | `/api/status`          | gateway  | State and session count            |
//! | `/ws`                  | gateway  | Browser session websocket          |
//! | `/api/settings`        | settings | Settings load/save                 |
//! | `/api/hosts`           | settings | Saved-host CRUD                    |
//! | `/api/models`          | settings | Assistant model list               |
//! | `/api/assistant/probe` | settings | Assistant reachability probe       |

use crate::gateway::{ws_router, Gateway, WsState};
use crate::settings::{settings_router, SettingsState};
use axum::{
    extract::State,
    http::HeaderValue,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Build the complete termbridge HTTP application
pub fn build_app(gateway: Arc<Gateway>) -> Router {
    let cors = build_cors(&gateway.config().gateway.allowed_origins);

    let ws_state = WsState {
        sessions: gateway.session_manager().clone(),
    };
    let settings_state = SettingsState {
        store: gateway.settings().clone(),
        assistant: gateway.assistant().clone(),
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/status", get(get_status))
        .with_state(gateway)
        .merge(ws_router(ws_state))
        .merge(settings_router(settings_state))
        .layer(cors)
}

/// Build the CORS layer from the configured origins
fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let list: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(list))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Status response
#[derive(Debug, Serialize)]
struct StatusResponse {
    state: String,
    session_count: usize,
    assistant_url: String,
}

/// Get gateway status
async fn get_status(State(gateway): State<Arc<Gateway>>) -> impl IntoResponse {
    Json(StatusResponse {
        state: format!("{:?}", gateway.state().await),
        session_count: gateway.session_manager().session_count().await,
        assistant_url: gateway.config().assistant.base_url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayBuilder;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn make_app(dir: &TempDir) -> Router {
        let gateway = Arc::new(
            GatewayBuilder::new()
                .settings_path(dir.path().join("settings.json"))
                .no_probe()
                .build()
                .await
                .unwrap(),
        );
        build_app(gateway)
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = TempDir::new().unwrap();
        let app = make_app(&dir).await;

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 1024 * 64)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_reports_no_sessions() {
        let dir = TempDir::new().unwrap();
        let app = make_app(&dir).await;

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 1024 * 64)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["session_count"], 0);
        assert_eq!(json["state"], "Stopped");
    }

    #[tokio::test]
    async fn test_settings_routes_are_merged() {
        let dir = TempDir::new().unwrap();
        let app = make_app(&dir).await;

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/settings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
