//! Liveness endpoint and the root banner

use crate::openapi::HEALTH_TAG;
use crate::state::AppState;
use crate::store::StoreBackend;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use http::StatusCode;
use log::warn;
use serde_json::json;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/healthy", get(healthy))
}

/// Root endpoint: redirect to the front-end when one is configured,
/// otherwise report that the service is up
async fn root(State(state): State<AppState>) -> Response {
    match state.config.frontend_url.as_deref() {
        Some(frontend) => Redirect::temporary(frontend).into_response(),
        None => "Roblox Discord verification service online".into_response(),
    }
}

/// Liveness check covering the persistent store
#[utoipa::path(
    get,
    path = "/healthy",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service and store are healthy"),
        (status = 503, description = "Store is unreachable")
    )
)]
pub(crate) async fn healthy(State(state): State<AppState>) -> Response {
    match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "ok"}))).into_response(),
        Err(err) => {
            warn!("Store health check failed: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unhealthy", "detail": err.to_string()})),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestFixture;

    #[tokio::test]
    async fn test_healthy_endpoint() {
        let fixture = TestFixture::new().await;
        let response = fixture.get_unauthenticated("/healthy").await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json()["status"], "ok");
    }

    #[tokio::test]
    async fn test_root_banner() {
        let fixture = TestFixture::new().await;
        let response = fixture.get_unauthenticated("/").await;
        response.assert_status(StatusCode::OK);
        assert!(response.text().contains("online"));
    }
}
