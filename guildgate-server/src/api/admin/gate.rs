//! Authorization gate guarding admin-grant mutations

use crate::api::admin::grants::{
    AdminGrant, GrantStore, SubjectKind, MAX_ADMIN_LEVEL, MIN_ADMIN_LEVEL,
};
use crate::api::admin::resolver::PermissionResolver;
use crate::store::StoreError;
use log::info;
use thiserror::Error;

/// Minimum effective level an actor needs to add or delete grants
pub const REQUIRED_ADMIN_LEVEL: u32 = 5;

/// Errors and routine denials produced by gated admin commands
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Admin level {actual} is below the required level {required}")]
    InsufficientLevel { required: u32, actual: u32 },
    #[error("Admin level {0} is outside the allowed range {MIN_ADMIN_LEVEL}..={MAX_ADMIN_LEVEL}")]
    OutOfRange(u32),
    #[error("Subject already holds an admin level in this guild")]
    DuplicateSubject,
    #[error("Subject holds no admin level in this guild")]
    NotFound,
}

impl CommandError {
    /// Machine-readable code reported back to the invoking bot
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Store(_) => "store_error",
            Self::InsufficientLevel { .. } => "insufficient_level",
            Self::OutOfRange(_) => "out_of_range",
            Self::DuplicateSubject => "duplicate_subject",
            Self::NotFound => "not_found",
        }
    }
}

/// The acting principal of an admin command, as reported by the bot
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: u64,
    pub role_ids: Vec<u64>,
}

/// Wraps grant mutations behind the level-5 authorization check.
///
/// Each request moves through authorization first, then argument
/// validation, then the single store write; a failure at any step leaves
/// the store untouched. Two racing `add` calls for the same subject both
/// pass the duplicate check and resolve last-writer-wins at the store.
#[derive(Clone)]
pub struct CommandGate {
    grants: GrantStore,
    resolver: PermissionResolver,
}

impl CommandGate {
    pub fn new(grants: GrantStore, resolver: PermissionResolver) -> Self {
        Self { grants, resolver }
    }

    /// List every grant in the guild. Unguarded: viewing admins requires no
    /// level, matching the chat command.
    pub async fn view(&self, guild_id: u64) -> Result<Vec<AdminGrant>, CommandError> {
        Ok(self.grants.list(guild_id).await?)
    }

    /// Grant `level` to a subject, guarded by the actor's own level
    pub async fn add(
        &self,
        guild_id: u64,
        actor: &Actor,
        subject_id: u64,
        kind: SubjectKind,
        level: u32,
        label: String,
    ) -> Result<AdminGrant, CommandError> {
        self.check_actor(guild_id, actor).await?;

        if !(MIN_ADMIN_LEVEL..=MAX_ADMIN_LEVEL).contains(&level) {
            return Err(CommandError::OutOfRange(level));
        }
        if self.grants.find(guild_id, subject_id).await?.is_some() {
            return Err(CommandError::DuplicateSubject);
        }

        let grant = AdminGrant {
            guild_id,
            subject_id,
            kind,
            level,
            label,
        };
        self.grants.insert(&grant).await?;
        info!(
            "Actor {} granted admin level {} to subject {} in guild {}",
            actor.id, level, subject_id, guild_id
        );
        Ok(grant)
    }

    /// Remove a subject's grant, guarded by the actor's own level
    pub async fn delete(
        &self,
        guild_id: u64,
        actor: &Actor,
        subject_id: u64,
    ) -> Result<AdminGrant, CommandError> {
        self.check_actor(guild_id, actor).await?;

        let existing = self
            .grants
            .find(guild_id, subject_id)
            .await?
            .ok_or(CommandError::NotFound)?;

        self.grants.remove(guild_id, subject_id).await?;
        info!(
            "Actor {} removed admin level {} from subject {} in guild {}",
            actor.id, existing.level, subject_id, guild_id
        );
        Ok(existing)
    }

    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    async fn check_actor(&self, guild_id: u64, actor: &Actor) -> Result<(), CommandError> {
        let actual = self
            .resolver
            .resolve(guild_id, actor.id, &actor.role_ids)
            .await?;
        if actual < REQUIRED_ADMIN_LEVEL {
            return Err(CommandError::InsufficientLevel {
                required: REQUIRED_ADMIN_LEVEL,
                actual,
            });
        }
        Ok(())
    }
}
