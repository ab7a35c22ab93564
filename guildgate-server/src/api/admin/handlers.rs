//! HTTP handlers mapping the `/admins` chat commands onto the command gate

use crate::api::admin::gate::CommandError;
use crate::api::admin::gate::Actor;
use crate::api::admin::grants::{AdminGrant, SubjectKind};
use crate::errors::ApiError;
use crate::openapi::ADMIN_TAG;
use crate::state::AppState;
use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
};
use http::StatusCode;
use log::error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The acting principal, as reported by the bot from the invoking member
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct ActorRef {
    /// Discord account id of the invoking member
    pub id: u64,
    /// Role ids the member currently holds in the guild
    #[serde(default)]
    pub role_ids: Vec<u64>,
}

impl From<&ActorRef> for Actor {
    fn from(actor: &ActorRef) -> Self {
        Actor {
            id: actor.id,
            role_ids: actor.role_ids.clone(),
        }
    }
}

/// Target of an add operation
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct SubjectRef {
    /// Whether the subject is an individual account or a role
    pub kind: SubjectKind,
    /// Account or role id
    pub id: u64,
    /// Display label; defaults to the Discord mention string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SubjectRef {
    fn label(&self) -> String {
        match (&self.label, self.kind) {
            (Some(label), _) => label.clone(),
            (None, SubjectKind::User) => format!("<@{}>", self.id),
            (None, SubjectKind::Role) => format!("<@&{}>", self.id),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct AddGrantRequest {
    pub actor: ActorRef,
    pub subject: SubjectRef,
    /// Admin level to assign, 1..=101 inclusive
    pub level: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct DeleteGrantRequest {
    pub actor: ActorRef,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct GrantListResponse {
    pub admins: Vec<AdminGrant>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct ResolveRequest {
    /// Discord account id being checked
    pub principal_id: u64,
    /// Role ids the principal currently holds in the guild
    #[serde(default)]
    pub role_ids: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct ResolveResponse {
    /// Effective admin level; 0 means no privilege
    pub level: u32,
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        let reason = err.reason();
        let status = match &err {
            CommandError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CommandError::InsufficientLevel { .. } => StatusCode::FORBIDDEN,
            CommandError::OutOfRange(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CommandError::DuplicateSubject => StatusCode::CONFLICT,
            CommandError::NotFound => StatusCode::NOT_FOUND,
        };
        if let CommandError::Store(inner) = &err {
            error!("Store error during admin command: {}", inner);
            return ApiError::internal("Store error during admin command").with_reason(reason);
        }
        ApiError::new(err.to_string(), status).with_reason(reason)
    }
}

/// List every admin grant in a guild (`/admins view`)
#[utoipa::path(
    get,
    path = "/guilds/{guild_id}/admins",
    tag = ADMIN_TAG,
    params(
        ("guild_id" = u64, Path, description = "Guild id"),
        ("Authorization" = String, Header, description = "Bearer API key"),
    ),
    responses(
        (status = 200, description = "Grants listed", body = GrantListResponse),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Internal server error")
    )
)]
pub(crate) async fn view_grants(
    State(state): State<AppState>,
    Path(guild_id): Path<u64>,
) -> Response {
    match state.gate.view(guild_id).await {
        Ok(admins) => (StatusCode::OK, Json(GrantListResponse { admins })).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Add an admin grant (`/admins add <subject> <level>`)
#[utoipa::path(
    post,
    path = "/guilds/{guild_id}/admins",
    tag = ADMIN_TAG,
    request_body = AddGrantRequest,
    params(
        ("guild_id" = u64, Path, description = "Guild id"),
        ("Authorization" = String, Header, description = "Bearer API key"),
    ),
    responses(
        (status = 200, description = "Grant created", body = AdminGrant),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Actor is below the required admin level"),
        (status = 409, description = "Subject already has a grant in this guild"),
        (status = 422, description = "Level outside the allowed range"),
        (status = 500, description = "Internal server error")
    )
)]
pub(crate) async fn add_grant(
    State(state): State<AppState>,
    Path(guild_id): Path<u64>,
    Json(request): Json<AddGrantRequest>,
) -> Response {
    let label = request.subject.label();
    match state
        .gate
        .add(
            guild_id,
            &Actor::from(&request.actor),
            request.subject.id,
            request.subject.kind,
            request.level,
            label,
        )
        .await
    {
        Ok(grant) => (StatusCode::OK, Json(grant)).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Remove an admin grant (`/admins delete <subject>`)
#[utoipa::path(
    delete,
    path = "/guilds/{guild_id}/admins/{subject_id}",
    tag = ADMIN_TAG,
    request_body = DeleteGrantRequest,
    params(
        ("guild_id" = u64, Path, description = "Guild id"),
        ("subject_id" = u64, Path, description = "Account or role id of the grant to remove"),
        ("Authorization" = String, Header, description = "Bearer API key"),
    ),
    responses(
        (status = 200, description = "Grant removed", body = AdminGrant),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Actor is below the required admin level"),
        (status = 404, description = "Subject holds no grant in this guild"),
        (status = 500, description = "Internal server error")
    )
)]
pub(crate) async fn delete_grant(
    State(state): State<AppState>,
    Path((guild_id, subject_id)): Path<(u64, u64)>,
    Json(request): Json<DeleteGrantRequest>,
) -> Response {
    match state
        .gate
        .delete(guild_id, &Actor::from(&request.actor), subject_id)
        .await
    {
        Ok(removed) => (StatusCode::OK, Json(removed)).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Compute a principal's effective admin level in a guild
#[utoipa::path(
    post,
    path = "/guilds/{guild_id}/resolve",
    tag = ADMIN_TAG,
    request_body = ResolveRequest,
    params(
        ("guild_id" = u64, Path, description = "Guild id"),
        ("Authorization" = String, Header, description = "Bearer API key"),
    ),
    responses(
        (status = 200, description = "Level resolved", body = ResolveResponse),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Internal server error")
    )
)]
pub(crate) async fn resolve_level(
    State(state): State<AppState>,
    Path(guild_id): Path<u64>,
    Json(request): Json<ResolveRequest>,
) -> Response {
    match state
        .resolver
        .resolve(guild_id, request.principal_id, &request.role_ids)
        .await
    {
        Ok(level) => (StatusCode::OK, Json(ResolveResponse { level })).into_response(),
        Err(err) => {
            error!("Failed to resolve admin level: {}", err);
            ApiError::internal("Failed to resolve admin level").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::admin::grants::AdminGrant;
    use crate::test_utils::TestFixture;
    use serde_json::json;

    async fn seed_actor_grant(fixture: &TestFixture, guild_id: u64, actor_id: u64, level: u32) {
        fixture
            .seed_grant(&AdminGrant {
                guild_id,
                subject_id: actor_id,
                kind: SubjectKind::User,
                level,
                label: format!("<@{}>", actor_id),
            })
            .await;
    }

    #[tokio::test]
    async fn test_view_empty_guild() {
        let fixture = TestFixture::new().await;
        let response = fixture.get("/guilds/1/admins").await;
        response.assert_status(StatusCode::OK);
        let body: GrantListResponse = response.json_as();
        assert!(body.admins.is_empty());
    }

    #[tokio::test]
    async fn test_admin_routes_require_api_key() {
        let fixture = TestFixture::new().await;
        let response = fixture.get_unauthenticated("/guilds/1/admins").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_add_and_view_grant() {
        let fixture = TestFixture::new().await;
        seed_actor_grant(&fixture, 1, 9, 10).await;

        let response = fixture
            .post(
                "/guilds/1/admins",
                &json!({
                    "actor": {"id": 9},
                    "subject": {"kind": "role", "id": 555},
                    "level": 40
                }),
            )
            .await;
        response.assert_status(StatusCode::OK);
        let grant: AdminGrant = response.json_as();
        assert_eq!(grant.level, 40);
        assert_eq!(grant.label, "<@&555>");

        let listed: GrantListResponse = fixture.get("/guilds/1/admins").await.json_as();
        assert_eq!(listed.admins.len(), 2);
    }

    #[tokio::test]
    async fn test_add_denied_without_level() {
        let fixture = TestFixture::new().await;

        let response = fixture
            .post(
                "/guilds/1/admins",
                &json!({
                    "actor": {"id": 9},
                    "subject": {"kind": "user", "id": 42},
                    "level": 10
                }),
            )
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(response.json()["reason"], "insufficient_level");
    }

    #[tokio::test]
    async fn test_add_out_of_range_level() {
        let fixture = TestFixture::new().await;
        seed_actor_grant(&fixture, 1, 9, 10).await;

        let response = fixture
            .post(
                "/guilds/1/admins",
                &json!({
                    "actor": {"id": 9},
                    "subject": {"kind": "user", "id": 42},
                    "level": 102
                }),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json()["reason"], "out_of_range");
    }

    #[tokio::test]
    async fn test_add_duplicate_subject() {
        let fixture = TestFixture::new().await;
        seed_actor_grant(&fixture, 1, 9, 10).await;

        let request = json!({
            "actor": {"id": 9},
            "subject": {"kind": "user", "id": 42},
            "level": 7
        });
        fixture
            .post("/guilds/1/admins", &request)
            .await
            .assert_status(StatusCode::OK);

        let response = fixture.post("/guilds/1/admins", &request).await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json()["reason"], "duplicate_subject");
    }

    #[tokio::test]
    async fn test_delete_grant_and_not_found() {
        let fixture = TestFixture::new().await;
        seed_actor_grant(&fixture, 1, 9, 10).await;
        fixture
            .post(
                "/guilds/1/admins",
                &json!({
                    "actor": {"id": 9},
                    "subject": {"kind": "user", "id": 42},
                    "level": 7
                }),
            )
            .await
            .assert_status(StatusCode::OK);

        let response = fixture
            .delete("/guilds/1/admins/42", &json!({"actor": {"id": 9}}))
            .await;
        response.assert_status(StatusCode::OK);
        let removed: AdminGrant = response.json_as();
        assert_eq!(removed.subject_id, 42);

        let response = fixture
            .delete("/guilds/1/admins/42", &json!({"actor": {"id": 9}}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json()["reason"], "not_found");
    }

    #[tokio::test]
    async fn test_resolve_returns_maximum_role_level() {
        let fixture = TestFixture::new().await;
        fixture
            .seed_grant(&AdminGrant {
                guild_id: 1,
                subject_id: 555,
                kind: SubjectKind::Role,
                level: 10,
                label: "<@&555>".into(),
            })
            .await;
        fixture
            .seed_grant(&AdminGrant {
                guild_id: 1,
                subject_id: 666,
                kind: SubjectKind::Role,
                level: 40,
                label: "<@&666>".into(),
            })
            .await;

        let response = fixture
            .post(
                "/guilds/1/resolve",
                &json!({"principal_id": 1001, "role_ids": [555, 666]}),
            )
            .await;
        response.assert_status(StatusCode::OK);
        let body: ResolveResponse = response.json_as();
        assert_eq!(body.level, 40);
    }

    #[tokio::test]
    async fn test_resolve_without_grants_is_zero() {
        let fixture = TestFixture::new().await;
        let response = fixture
            .post("/guilds/1/resolve", &json!({"principal_id": 1001}))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ResolveResponse = response.json_as();
        assert_eq!(body.level, 0);
    }
}
