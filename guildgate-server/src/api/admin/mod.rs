//! Tiered admin-level permission engine and its HTTP surface.
//!
//! The bot maps the `/admins view|add|delete` chat commands onto these
//! routes; `resolve` lets it gate its other commands on a member's
//! effective level. All routes sit behind the API key.

pub(crate) mod gate;
pub(crate) mod grants;
pub(crate) mod handlers;
pub(crate) mod resolver;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;

/// Combines all admin-grant routes into a single router
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/guilds/{guild_id}/admins",
            get(handlers::view_grants).post(handlers::add_grant),
        )
        .route(
            "/guilds/{guild_id}/admins/{subject_id}",
            axum::routing::delete(handlers::delete_grant),
        )
        .route("/guilds/{guild_id}/resolve", post(handlers::resolve_level))
}
