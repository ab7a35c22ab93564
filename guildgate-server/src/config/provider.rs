//! Identity provider (Roblox OAuth 2.0) configuration

use confique::Config;

/// OAuth 2.0 settings for the external identity provider.
///
/// The endpoint URLs default to the production Roblox OAuth service and are
/// only overridden in tests, where they point at a mock server.
#[derive(Debug, Config, Clone)]
pub struct ProviderConfig {
    /// OAuth application client id registered with the provider
    #[config(env = "GUILDGATE_PROVIDER_CLIENT_ID", default = "")]
    pub client_id: String,

    /// OAuth application client secret
    #[config(env = "GUILDGATE_PROVIDER_CLIENT_SECRET", default = "")]
    pub client_secret: String,

    /// Redirect URI pre-registered with the provider; the provider sends the
    /// browser back here with `code` and `state`
    #[config(
        env = "GUILDGATE_PROVIDER_REDIRECT_URI",
        default = "http://localhost:7880/auth/roblox/callback"
    )]
    pub redirect_uri: String,

    /// Authorization endpoint the user is redirected to
    #[config(
        env = "GUILDGATE_PROVIDER_AUTHORIZE_URL",
        default = "https://authorize.roblox.com/v1/authorize"
    )]
    pub authorize_url: String,

    /// Token endpoint used for the authorization-code exchange
    #[config(
        env = "GUILDGATE_PROVIDER_TOKEN_URL",
        default = "https://apis.roblox.com/oauth/v1/token"
    )]
    pub token_url: String,

    /// Userinfo endpoint used to fetch the verified identity claims
    #[config(
        env = "GUILDGATE_PROVIDER_USERINFO_URL",
        default = "https://apis.roblox.com/oauth/v1/userinfo"
    )]
    pub userinfo_url: String,

    /// Scopes requested during authorization
    #[config(env = "GUILDGATE_PROVIDER_SCOPE", default = "openid profile:read")]
    pub scope: String,

    /// Lifetime of an issued verification state token in seconds
    #[config(env = "GUILDGATE_PROVIDER_STATE_TTL", default = 120)]
    pub state_ttl: u64,

    /// Outbound request timeout in seconds for provider calls
    #[config(env = "GUILDGATE_PROVIDER_REQUEST_TIMEOUT", default = 10)]
    pub request_timeout: u64,
}
