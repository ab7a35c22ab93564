//! Effective admin-level resolution

use crate::api::admin::grants::GrantStore;
use crate::store::StoreError;

/// Computes the effective admin level of a principal in a guild.
///
/// Precedence: a direct grant for the account wins outright; otherwise the
/// maximum level among the principal's role grants applies; otherwise 0.
/// Taking the maximum (rather than the first match) makes the result
/// independent of role iteration order.
#[derive(Clone)]
pub struct PermissionResolver {
    grants: GrantStore,
}

impl PermissionResolver {
    pub fn new(grants: GrantStore) -> Self {
        Self { grants }
    }

    /// Effective level for `principal_id` holding `role_ids` in `guild_id`.
    /// Read-only; safe to call concurrently with grant mutations.
    pub async fn resolve(
        &self,
        guild_id: u64,
        principal_id: u64,
        role_ids: &[u64],
    ) -> Result<u32, StoreError> {
        if let Some(grant) = self.grants.find(guild_id, principal_id).await? {
            return Ok(grant.level);
        }

        let mut level = 0;
        for role_id in role_ids {
            if let Some(grant) = self.grants.find(guild_id, *role_id).await? {
                level = level.max(grant.level);
            }
        }
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::admin::grants::{AdminGrant, SubjectKind};
    use crate::store::memory::MemoryStore;
    use crate::store::Store;

    async fn seed(grants: &GrantStore, subject_id: u64, kind: SubjectKind, level: u32) {
        grants
            .insert(&AdminGrant {
                guild_id: 1,
                subject_id,
                kind,
                level,
                label: format!("<@{}>", subject_id),
            })
            .await
            .unwrap();
    }

    fn create_test_resolver() -> (PermissionResolver, GrantStore) {
        let grants = GrantStore::new(Store::Memory(MemoryStore::new()));
        (PermissionResolver::new(grants.clone()), grants)
    }

    #[tokio::test]
    async fn test_direct_grant_takes_precedence() {
        let (resolver, grants) = create_test_resolver();
        seed(&grants, 1001, SubjectKind::User, 7).await;
        seed(&grants, 555, SubjectKind::Role, 40).await;

        // The direct grant wins even though a held role carries more
        let level = resolver.resolve(1, 1001, &[555]).await.unwrap();
        assert_eq!(level, 7);
    }

    #[tokio::test]
    async fn test_maximum_role_level_wins() {
        let (resolver, grants) = create_test_resolver();
        seed(&grants, 555, SubjectKind::Role, 10).await;
        seed(&grants, 666, SubjectKind::Role, 40).await;

        let level = resolver.resolve(1, 1001, &[555, 666]).await.unwrap();
        assert_eq!(level, 40);

        // Iteration order must not matter
        let level = resolver.resolve(1, 1001, &[666, 555]).await.unwrap();
        assert_eq!(level, 40);
    }

    #[tokio::test]
    async fn test_no_grant_resolves_to_zero() {
        let (resolver, grants) = create_test_resolver();
        seed(&grants, 555, SubjectKind::Role, 10).await;

        let level = resolver.resolve(1, 1001, &[777, 888]).await.unwrap();
        assert_eq!(level, 0);

        let level = resolver.resolve(1, 1001, &[]).await.unwrap();
        assert_eq!(level, 0);
    }

    #[tokio::test]
    async fn test_resolution_is_guild_scoped() {
        let (resolver, grants) = create_test_resolver();
        seed(&grants, 1001, SubjectKind::User, 50).await;

        let level = resolver.resolve(2, 1001, &[]).await.unwrap();
        assert_eq!(level, 0);
    }
}
