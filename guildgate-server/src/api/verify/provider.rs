//! Roblox OAuth 2.0 client: authorization-code exchange and identity fetch

use crate::config::ProviderConfig;
use http::StatusCode;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Errors that can occur while talking to the identity provider
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Transport failure talking to the identity provider: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Identity provider rejected the request with status {0}")]
    ProviderRejected(StatusCode),
    #[error("Token response did not contain an access token")]
    MissingToken,
    #[error("Userinfo response did not contain a subject claim")]
    MissingSubject,
    #[error("Invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Identity claims fetched from the provider's userinfo endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaims {
    /// Stable provider-side account identifier (the `sub` claim)
    pub subject: String,
    /// Human-facing display name
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserinfoResponse {
    sub: Option<String>,
    nickname: Option<String>,
    preferred_username: Option<String>,
}

/// Client for the external identity provider.
///
/// Performs exactly one attempt per call: authorization codes are single-use
/// by provider contract, so retrying a consumed code cannot succeed.
#[derive(Clone)]
pub struct ProviderClient {
    http: Client,
    config: ProviderConfig,
}

impl ProviderClient {
    pub fn new(http: Client, config: ProviderConfig) -> Self {
        Self { http, config }
    }

    /// Build the provider authorization URL carrying the given state token
    pub fn authorize_url(&self, state_token: &str) -> Result<String, ExchangeError> {
        let mut url = Url::parse(&self.config.authorize_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scope)
            .append_pair("state", state_token);
        Ok(url.to_string())
    }

    /// Trade an authorization code for a bearer access token
    pub async fn exchange(&self, authorization_code: &str) -> Result<String, ExchangeError> {
        debug!("Exchanging authorization code at {}", self.config.token_url);

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", authorization_code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Token exchange rejected with status {}", status);
            return Err(ExchangeError::ProviderRejected(status));
        }

        let body: TokenResponse = response.json().await?;
        match body.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ExchangeError::MissingToken),
        }
    }

    /// Fetch the verified identity claims using a bearer token
    pub async fn fetch_identity(&self, access_token: &str) -> Result<IdentityClaims, ExchangeError> {
        debug!("Fetching identity claims from {}", self.config.userinfo_url);

        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Userinfo request rejected with status {}", status);
            return Err(ExchangeError::ProviderRejected(status));
        }

        let body: UserinfoResponse = response.json().await?;
        let subject = match body.sub {
            Some(sub) if !sub.is_empty() => sub,
            _ => return Err(ExchangeError::MissingSubject),
        };
        // Roblox sends the display name as `nickname`; fall back gracefully
        let display_name = body
            .nickname
            .or(body.preferred_username)
            .unwrap_or_else(|| subject.clone());

        Ok(IdentityClaims {
            subject,
            display_name,
        })
    }
}
