use crate::api::admin::gate::CommandGate;
use crate::api::admin::grants::GrantStore;
use crate::api::admin::resolver::PermissionResolver;
use crate::api::verify::provider::ProviderClient;
use crate::api::verify::records::RecordStore;
use crate::api::verify::tokens::TokenRegistry;
use crate::config::GateConfig;
use crate::store::{create_store, Store};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GateConfig>,
    pub store: Store,
    pub tokens: TokenRegistry,
    pub provider: ProviderClient,
    pub records: RecordStore,
    pub resolver: PermissionResolver,
    pub gate: CommandGate,
}

impl AppState {
    fn create_provider_http_client(timeout_secs: u64) -> Client {
        // Specialized client for the identity provider; its timeout is the
        // only one the exchange path has
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(2))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .expect("Failed to create provider HTTP client")
    }

    pub async fn new(config: GateConfig) -> Result<Self, std::io::Error> {
        let store = create_store(&config).await.map_err(|e| {
            std::io::Error::other(format!("Failed to create store: {}", e))
        })?;
        Ok(Self::with_store(config, store))
    }

    /// Assemble the state over an already-created store
    pub fn with_store(config: GateConfig, store: Store) -> Self {
        let http = Self::create_provider_http_client(config.provider.request_timeout);
        let provider = ProviderClient::new(http, config.provider.clone());
        let tokens = TokenRegistry::new(store.clone(), config.provider.state_ttl);
        let records = RecordStore::new(store.clone());
        let grants = GrantStore::new(store.clone());
        let resolver = PermissionResolver::new(grants.clone());
        let gate = CommandGate::new(grants, resolver.clone());

        Self {
            config: Arc::new(config),
            store,
            tokens,
            provider,
            records,
            resolver,
            gate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_app_state_clone_shares_config() {
        let provider_mock = MockServer::start().await;
        let config = GateConfig::for_test_with_mocks(&provider_mock);
        let state = AppState::with_store(config, Store::Memory(MemoryStore::new()));
        let state2 = state.clone();

        assert_eq!(Arc::as_ptr(&state.config), Arc::as_ptr(&state2.config));
    }

    #[tokio::test]
    async fn test_app_state_components_share_store() {
        let provider_mock = MockServer::start().await;
        let config = GateConfig::for_test_with_mocks(&provider_mock);
        let state = AppState::with_store(config, Store::Memory(MemoryStore::new()));

        // A token issued through one component handle is visible through
        // another clone of the state
        let token = state.tokens.issue(1001).await.unwrap();
        let cloned = state.clone();
        assert_eq!(cloned.tokens.consume(&token).await.unwrap(), 1001);
    }
}
