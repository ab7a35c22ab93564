//! HTTP handlers for the OAuth verification flow

use crate::api::verify::provider::ExchangeError;
use crate::api::verify::tokens::TokenError;
use crate::errors::ApiError;
use crate::openapi::VERIFY_TAG;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use http::{header::LOCATION, StatusCode};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

/// Request to start a verification for a Discord account
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct BeginRequest {
    /// Discord account id of the member being verified
    pub discord_id: u64,
}

/// A freshly issued verification attempt
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct BeginResponse {
    /// Anti-forgery state token bound to the Discord account
    pub state: String,
    /// Provider authorization URL for the member to open
    pub authorize_url: String,
    /// Seconds until the state token expires
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartParams {
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Issue a state token for a Discord account and hand back the provider
/// authorization URL. Called by the bot when a member clicks the verify
/// button; any previous pending attempt for the account is superseded.
#[utoipa::path(
    post,
    path = "/auth/roblox/begin",
    tag = VERIFY_TAG,
    request_body = BeginRequest,
    responses(
        (status = 200, description = "Verification attempt created", body = BeginResponse),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Internal server error")
    )
)]
pub(crate) async fn begin(
    State(state): State<AppState>,
    Json(request): Json<BeginRequest>,
) -> Response {
    info!("Starting verification for Discord account {}", request.discord_id);

    let token = match state.tokens.issue(request.discord_id).await {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue state token: {}", err);
            return ApiError::internal("Failed to start verification").into_response();
        }
    };

    let authorize_url = match state.provider.authorize_url(&token) {
        Ok(url) => url,
        Err(err) => {
            error!("Failed to build authorization URL: {}", err);
            return ApiError::internal("Failed to build authorization URL").into_response();
        }
    };

    (
        StatusCode::OK,
        Json(BeginResponse {
            state: token,
            authorize_url,
            expires_in: state.config.provider.state_ttl,
        }),
    )
        .into_response()
}

/// Redirect the member's browser to the provider authorization page.
#[utoipa::path(
    get,
    path = "/auth/roblox",
    tag = VERIFY_TAG,
    params(
        ("state" = String, Query, description = "State token from a begin call"),
    ),
    responses(
        (status = 302, description = "Redirect to the provider authorization URL"),
        (status = 400, description = "Missing state parameter")
    )
)]
pub(crate) async fn start(
    State(state): State<AppState>,
    Query(params): Query<StartParams>,
) -> Response {
    let Some(state_token) = params.state.as_deref() else {
        return ApiError::bad_request("Missing state parameter")
            .with_reason("invalid_state")
            .into_response();
    };

    match state.provider.authorize_url(state_token) {
        Ok(url) => found(&url),
        Err(err) => {
            error!("Failed to build authorization URL: {}", err);
            ApiError::internal("Failed to build authorization URL").into_response()
        }
    }
}

/// Handle the OAuth callback from the provider.
///
/// Validates and consumes the state token, performs the code-to-token
/// exchange and identity fetch (one attempt each), and persists the
/// verification record. Renders a result page, or redirects to the
/// configured front-end with `status`/`username` (`status=error&message=...`
/// for failures after a code was present).
#[utoipa::path(
    get,
    path = "/auth/roblox/callback",
    tag = VERIFY_TAG,
    params(
        ("code" = Option<String>, Query, description = "Authorization code from the provider"),
        ("state" = Option<String>, Query, description = "State token from the initiating attempt"),
        ("error" = Option<String>, Query, description = "Provider-reported error code"),
    ),
    responses(
        (status = 200, description = "Verification completed, result page rendered"),
        (status = 302, description = "Redirect to the configured front-end"),
        (status = 400, description = "Provider error, missing code, or invalid state"),
        (status = 502, description = "Exchange with the provider failed"),
        (status = 500, description = "Verification succeeded but could not be saved")
    )
)]
pub(crate) async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(provider_error) = params.error.as_deref() {
        warn!("Provider reported an error on callback: {}", provider_error);
        return error_page(
            StatusCode::BAD_REQUEST,
            &format!("An error occurred during verification: {}", provider_error),
        );
    }

    let Some(code) = params.code.as_deref() else {
        return error_page(
            StatusCode::BAD_REQUEST,
            "No authorization code was provided by Roblox.",
        );
    };
    let Some(state_token) = params.state.as_deref() else {
        return error_page(
            StatusCode::BAD_REQUEST,
            "No state token was provided. Please restart verification from Discord.",
        );
    };

    // The state token is validated (and burned) before the code is spent,
    // so a forged callback never reaches the provider.
    let discord_id = match state.tokens.consume(state_token).await {
        Ok(discord_id) => discord_id,
        Err(TokenError::Expired) => {
            return failure(
                &state,
                StatusCode::BAD_REQUEST,
                "state_expired",
                "Your verification link has expired. Please restart verification from Discord.",
            );
        }
        Err(TokenError::UnknownToken) | Err(TokenError::Superseded) => {
            return failure(
                &state,
                StatusCode::BAD_REQUEST,
                "invalid_state",
                "This verification link is no longer valid. Please restart verification from Discord.",
            );
        }
        Err(err) => {
            error!("State token validation failed: {}", err);
            return failure(
                &state,
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "Something went wrong on our side. Please try again.",
            );
        }
    };

    let access_token = match state.provider.exchange(code).await {
        Ok(token) => token,
        Err(err) => {
            warn!(
                "Token exchange failed for Discord account {}: {}",
                discord_id, err
            );
            let reason = match err {
                ExchangeError::MissingToken => "no_token",
                _ => "auth_failed",
            };
            return failure(
                &state,
                StatusCode::BAD_GATEWAY,
                reason,
                "Failed to verify your account with Roblox. Please try again.",
            );
        }
    };

    let claims = match state.provider.fetch_identity(&access_token).await {
        Ok(claims) => claims,
        Err(err) => {
            warn!(
                "Identity fetch failed for Discord account {}: {}",
                discord_id, err
            );
            let reason = match err {
                ExchangeError::MissingSubject => "invalid_user_data",
                _ => "user_info_failed",
            };
            return failure(
                &state,
                StatusCode::BAD_GATEWAY,
                reason,
                "Failed to fetch your Roblox account details. Please try again.",
            );
        }
    };

    // The identity exchange already succeeded; a write failure here is a
    // server fault, reported distinctly from exchange failure.
    match state
        .records
        .upsert(discord_id, &claims.subject, &claims.display_name, Utc::now())
        .await
    {
        Ok(record) => {
            info!(
                "Verified Discord account {} as Roblox user {} ({})",
                discord_id, record.roblox_id, record.username
            );
            success(&state, &record.username)
        }
        Err(err) => {
            error!(
                "Failed to persist verification record for {}: {}",
                discord_id, err
            );
            failure(
                &state,
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "Your Roblox login succeeded but we could not save the verification. Please try again.",
            )
        }
    }
}

/// 302 redirect; axum's `Redirect` helpers emit 303/307, the provider
/// contract here is a plain Found
fn found(url: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, url.to_string())]).into_response()
}

fn success(state: &AppState, username: &str) -> Response {
    if let Some(frontend) = state.config.frontend_url.as_deref() {
        if let Some(url) = frontend_url(frontend, &[("status", "success"), ("username", username)])
        {
            return found(&url);
        }
    }
    success_page(username)
}

fn failure(state: &AppState, status: StatusCode, reason: &'static str, message: &str) -> Response {
    if let Some(frontend) = state.config.frontend_url.as_deref() {
        if let Some(url) = frontend_url(frontend, &[("status", "error"), ("message", reason)]) {
            return found(&url);
        }
    }
    error_page(status, message)
}

fn frontend_url(frontend: &str, pairs: &[(&str, &str)]) -> Option<String> {
    let mut url = match Url::parse(frontend) {
        Ok(url) => url,
        Err(err) => {
            error!("Configured front-end URL is invalid: {}", err);
            return None;
        }
    };
    url.query_pairs_mut().extend_pairs(pairs);
    Some(url.to_string())
}

fn success_page(username: &str) -> Response {
    let body = render_page(
        "Verification Complete",
        "✅ Verification Complete",
        &format!(
            "Your account has been successfully verified as <strong>{}</strong>!<br>\
             You can now close this window and return to Discord.",
            username
        ),
    );
    (StatusCode::OK, Html(body)).into_response()
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let body = render_page(
        "Verification Error",
        "Verification Error",
        &format!("{}<br>Please try again.", message),
    );
    (status, Html(body)).into_response()
}

fn render_page(title: &str, heading: &str, message: &str) -> String {
    format!(
        "<html>\n\
         <head><title>{title}</title></head>\n\
         <body style=\"font-family: Arial, sans-serif; text-align: center; padding: 50px;\">\n\
         <h1>{heading}</h1>\n\
         <p>{message}</p>\n\
         </body>\n\
         </html>"
    )
}
