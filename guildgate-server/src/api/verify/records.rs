//! Durable Discord-to-Roblox verification records

use crate::store::{Store, StoreBackend, StoreError};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The durable mapping from a Discord account to its verified Roblox account
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct VerificationRecord {
    /// Discord account id (primary key)
    pub discord_id: u64,
    /// Provider-side account id; informational, may change on re-verification
    pub roblox_id: String,
    /// Provider-side display name at verification time
    pub username: String,
    /// When the account was first verified; preserved across re-verification
    pub verified_at: DateTime<Utc>,
    /// When the record was last written
    pub last_updated: DateTime<Utc>,
}

/// Upsert-only access to verification records, keyed by Discord account id.
/// Records are never deleted here; removal is an administrative action
/// outside this service.
#[derive(Clone)]
pub struct RecordStore {
    store: Store,
}

impl RecordStore {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create or overwrite the record for `discord_id`.
    ///
    /// Idempotent: replaying the same inputs yields the same final state
    /// except for `last_updated`, which always advances. `verified_at` is
    /// set only when the record is first created.
    pub async fn upsert(
        &self,
        discord_id: u64,
        roblox_id: &str,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<VerificationRecord, StoreError> {
        let key = Self::key(discord_id);
        let existing: Option<VerificationRecord> = self.store.get(&key).await?;

        let record = VerificationRecord {
            discord_id,
            roblox_id: roblox_id.to_string(),
            username: username.to_string(),
            verified_at: existing.map(|r| r.verified_at).unwrap_or(now),
            last_updated: now,
        };

        self.store.put(&key, &record).await?;
        debug!(
            "Stored verification record for {} -> {} ({})",
            discord_id, record.roblox_id, record.username
        );
        Ok(record)
    }

    /// Fetch the record for `discord_id`, if any
    pub async fn find(&self, discord_id: u64) -> Result<Option<VerificationRecord>, StoreError> {
        self.store.get(&Self::key(discord_id)).await
    }

    fn key(discord_id: u64) -> String {
        format!("verified:{}", discord_id)
    }
}
