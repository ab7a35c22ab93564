//! Admin grant model and store access

use crate::store::{Store, StoreBackend, StoreError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Bounds of a valid admin level, inclusive
pub const MIN_ADMIN_LEVEL: u32 = 1;
pub const MAX_ADMIN_LEVEL: u32 = 101;

/// Whether a grant targets an individual account or a guild role
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    User,
    Role,
}

/// A single admin-level grant inside a guild.
///
/// Uniqueness is enforced on (guild_id, subject_id) alone via the store key;
/// Discord snowflakes do not collide between users and roles in practice,
/// and the original system relied on the same property.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct AdminGrant {
    /// Guild the grant is scoped to
    pub guild_id: u64,
    /// Account or role id the grant targets
    pub subject_id: u64,
    /// Whether the subject is an individual account or a role
    pub kind: SubjectKind,
    /// Privilege ceiling, 1..=101 inclusive
    pub level: u32,
    /// Display label for the subject (mention string for the bot to render)
    pub label: String,
}

/// Store access for admin grants, keyed by (guild id, subject id)
#[derive(Clone)]
pub struct GrantStore {
    store: Store,
}

impl GrantStore {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn find(
        &self,
        guild_id: u64,
        subject_id: u64,
    ) -> Result<Option<AdminGrant>, StoreError> {
        self.store.get(&Self::key(guild_id, subject_id)).await
    }

    pub async fn insert(&self, grant: &AdminGrant) -> Result<(), StoreError> {
        self.store
            .put(&Self::key(grant.guild_id, grant.subject_id), grant)
            .await
    }

    pub async fn remove(&self, guild_id: u64, subject_id: u64) -> Result<bool, StoreError> {
        self.store.delete(&Self::key(guild_id, subject_id)).await
    }

    /// All grants in a guild, ordered by level then subject id so the bot's
    /// rendering is stable across calls
    pub async fn list(&self, guild_id: u64) -> Result<Vec<AdminGrant>, StoreError> {
        let mut grants: Vec<AdminGrant> = self
            .store
            .scan_prefix(&format!("admins:{}:", guild_id))
            .await?;
        grants.sort_by_key(|g| (g.level, g.subject_id));
        Ok(grants)
    }

    fn key(guild_id: u64, subject_id: u64) -> String {
        format!("admins:{}:{}", guild_id, subject_id)
    }
}
