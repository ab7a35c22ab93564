pub(crate) use crate::config::provider::ProviderConfig;
pub(crate) use crate::config::store::{StoreConfig, StoreKind};
use confique::Config;

pub mod provider;
pub mod store;

/// Main configuration structure for the guildgate server.
///
/// Every value is environment-sourced under the `GUILDGATE_` prefix so the
/// service can run unchanged on Railway/Render style hosts.
#[derive(Debug, Config, Clone)]
pub struct GateConfig {
    /// The port the server will listen on (default: 7880)
    #[config(env = "GUILDGATE_PORT", default = 7880)]
    pub port: u16,

    /// Shared secret the Discord bot presents as a bearer token on the
    /// admin routes. Empty disables authentication (local development only).
    #[config(env = "GUILDGATE_API_KEY", default = "")]
    pub api_key: String,

    /// Front-end URL the callback redirects to after verification.
    /// When unset the callback renders its own HTML result pages.
    #[config(env = "GUILDGATE_FRONTEND_URL")]
    pub frontend_url: Option<String>,

    /// Identity provider (Roblox OAuth 2.0) configuration
    #[config(nested)]
    pub provider: ProviderConfig,

    /// Persistent store configuration
    #[config(nested)]
    pub store: StoreConfig,
}

impl GateConfig {
    /// Load the configuration from environment variables
    pub fn load() -> Result<Self, confique::Error> {
        Self::builder().env().load()
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(provider_mock: &wiremock::MockServer) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            api_key: "test_api_key".to_string(),
            frontend_url: None,
            provider: ProviderConfig {
                client_id: "test_client_id".to_string(),
                client_secret: "test_client_secret".to_string(),
                redirect_uri: "http://localhost:7880/auth/roblox/callback".to_string(),
                authorize_url: format!("{}/v1/authorize", provider_mock.uri()),
                token_url: format!("{}/oauth/v1/token", provider_mock.uri()),
                userinfo_url: format!("{}/oauth/v1/userinfo", provider_mock.uri()),
                scope: "openid profile:read".to_string(),
                state_ttl: 120,
                request_timeout: 5,
            },
            store: StoreConfig {
                kind: StoreKind::Memory,
                redis_url: "".to_string(),
            },
        }
    }
}
