//! OAuth verification flow: state tokens, the provider exchange, and the
//! durable Discord-to-Roblox records.
//!
//! The browser-facing routes (`/auth/roblox`, `/auth/roblox/callback`) are
//! public; `/auth/roblox/begin` is called by the bot and sits behind the
//! API key with the admin routes.

pub(crate) mod handlers;
pub(crate) mod provider;
pub(crate) mod records;
pub(crate) mod tokens;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;

/// Routes the member's browser touches during the OAuth round-trip
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/roblox", get(handlers::start))
        .route("/auth/roblox/start", get(handlers::start))
        .route("/auth/roblox/callback", get(handlers::callback))
}

/// Routes reserved for the bot
pub(super) fn protected_router() -> Router<AppState> {
    Router::new().route("/auth/roblox/begin", post(handlers::begin))
}
