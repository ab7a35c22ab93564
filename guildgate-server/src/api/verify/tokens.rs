//! Anti-forgery state token management for the verification flow

use crate::store::{Store, StoreBackend, StoreError};
use log::{debug, warn};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;

/// Length of a generated state token. The provider round-trips it opaquely,
/// so longer is free; 32 alphanumeric chars is far beyond guessable.
const TOKEN_LEN: usize = 32;

/// Errors that can occur during state token operations
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("State token not found")]
    UnknownToken,
    #[error("State token expired")]
    Expired,
    #[error("State token superseded by a newer verification attempt")]
    Superseded,
    #[error("System clock error: {0}")]
    Clock(String),
}

/// A pending verification, stored under the token value
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PendingVerification {
    /// Discord account that initiated the verification
    pub discord_id: u64,
    /// Unix timestamp (seconds) of issuance
    pub issued_at: u64,
}

/// Issues and consumes the short-lived anti-forgery tokens that correlate
/// an OAuth redirect round-trip to its initiating Discord account.
///
/// Two documents exist per pending verification: the token itself
/// (`verify:state:{token}` -> [`PendingVerification`]) and a reverse index
/// (`verify:principal:{discord_id}` -> token) used to enforce the
/// one-live-token-per-principal rule. Expiry is checked lazily against
/// `issued_at` on consume; the store-level TTL only reclaims space.
#[derive(Clone)]
pub struct TokenRegistry {
    store: Store,
    ttl_secs: u64,
    // Per-principal critical sections so two concurrent callbacks cannot
    // both consume the same token. Guards in-process tasks only; the store
    // delete is the cross-instance backstop.
    locks: Arc<StdMutex<HashMap<u64, Arc<Mutex<()>>>>>,
}

impl TokenRegistry {
    /// Create a new registry over the given store
    pub fn new(store: Store, ttl_secs: u64) -> Self {
        Self {
            store,
            ttl_secs,
            locks: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Issue a fresh state token for `discord_id`, silently invalidating any
    /// prior live token for the same account.
    pub async fn issue(&self, discord_id: u64) -> Result<String, TokenError> {
        let lock = self.principal_lock(discord_id);
        let _guard = lock.lock().await;

        // A newly issued token supersedes the previous one, if any
        if let Some(old_token) = self
            .store
            .get::<String>(&Self::principal_key(discord_id))
            .await?
        {
            if !self.store.delete(&Self::state_key(&old_token)).await? {
                debug!("Previous state token for {} had already lapsed", discord_id);
            }
        }

        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();

        let pending = PendingVerification {
            discord_id,
            issued_at: unix_now()?,
        };

        self.store
            .put_ex(&Self::state_key(&token), &pending, self.ttl_secs)
            .await?;
        self.store
            .put_ex(&Self::principal_key(discord_id), &token, self.ttl_secs)
            .await?;

        debug!(
            "Issued state token for {}, expires in {}s",
            discord_id, self.ttl_secs
        );
        Ok(token)
    }

    /// Validate `token` and atomically remove it, returning the Discord
    /// account it was issued to.
    ///
    /// Fails closed on every mismatch: unknown value, expired, superseded by
    /// a newer issuance, or already consumed.
    pub async fn consume(&self, token: &str) -> Result<u64, TokenError> {
        // First read is only to learn which principal's lock to take
        let pending: PendingVerification = self
            .store
            .get(&Self::state_key(token))
            .await?
            .ok_or(TokenError::UnknownToken)?;

        let lock = self.principal_lock(pending.discord_id);
        let _guard = lock.lock().await;

        // Re-read under the lock; a concurrent consume may have won
        let pending: PendingVerification = self
            .store
            .get(&Self::state_key(token))
            .await?
            .ok_or(TokenError::UnknownToken)?;

        if unix_now()?.saturating_sub(pending.issued_at) >= self.ttl_secs {
            self.remove_pair(token, pending.discord_id).await;
            return Err(TokenError::Expired);
        }

        let current = self
            .store
            .get::<String>(&Self::principal_key(pending.discord_id))
            .await?;
        if current.as_deref() != Some(token) {
            // Stale token document left behind by a newer issuance
            if let Err(err) = self.store.delete(&Self::state_key(token)).await {
                warn!("Failed to delete superseded state token: {}", err);
            }
            return Err(TokenError::Superseded);
        }

        self.remove_pair(token, pending.discord_id).await;
        debug!("Consumed state token for {}", pending.discord_id);
        Ok(pending.discord_id)
    }

    async fn remove_pair(&self, token: &str, discord_id: u64) {
        if let Err(err) = self.store.delete(&Self::state_key(token)).await {
            warn!("Failed to delete state token: {}", err);
        }
        if let Err(err) = self.store.delete(&Self::principal_key(discord_id)).await {
            warn!("Failed to delete principal token index: {}", err);
        }
    }

    fn principal_lock(&self, discord_id: u64) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("token lock map poisoned");
        locks
            .entry(discord_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn state_key(token: &str) -> String {
        format!("verify:state:{}", token)
    }

    fn principal_key(discord_id: u64) -> String {
        format!("verify:principal:{}", discord_id)
    }
}

fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| TokenError::Clock(e.to_string()))
}
