pub(crate) mod admin;
pub(crate) mod health;
pub(crate) mod verify;

use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use http::header::AUTHORIZATION;

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(verify::router())
        .merge(protected_routes(state))
}

/// Routes only the bot may call: admin-grant management and verification
/// initiation. Guarded by the shared API key when one is configured.
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(admin::router())
        .merge(verify::protected_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    // An empty key disables authentication (local development)
    if state.config.api_key.is_empty() {
        return next.run(request).await;
    }

    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value))
        .is_some_and(|presented| presented == state.config.api_key);

    if authorized {
        next.run(request).await
    } else {
        ApiError::unauthorized("Missing or invalid API key").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestFixture;
    use http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_browser_routes_need_no_api_key() {
        let fixture = TestFixture::new().await;
        let response = fixture
            .get_unauthenticated("/auth/roblox?state=sometoken")
            .await;
        response.assert_status(StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_begin_requires_api_key() {
        let fixture = TestFixture::new().await;
        let response = fixture
            .post_unauthenticated("/auth/roblox/begin", &json!({"discord_id": 1001}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_api_key_is_rejected() {
        let fixture = TestFixture::new().await;
        let response = fixture
            .get_with_bearer("/guilds/1/admins", "not-the-key")
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
