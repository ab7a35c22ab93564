use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const VERIFY_TAG: &str = "Verification API";
pub(crate) const ADMIN_TAG: &str = "Admin API";

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = VERIFY_TAG, description = "Roblox OAuth verification flow"),
        (name = ADMIN_TAG, description = "Guild admin-level management"),
    ),
    paths(
        crate::api::health::healthy,
        crate::api::verify::handlers::begin,
        crate::api::verify::handlers::start,
        crate::api::verify::handlers::callback,
        crate::api::admin::handlers::view_grants,
        crate::api::admin::handlers::add_grant,
        crate::api::admin::handlers::delete_grant,
        crate::api::admin::handlers::resolve_level,
    ),
    info(
        title = "guildgate API",
        description = "Discord verification and admin-level service",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
