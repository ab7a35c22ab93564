//! Persistent store configuration

use confique::Config;
use serde::Deserialize;

/// Which store backend to use
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// In-process store, lost on restart (development and tests)
    Memory,
    /// Redis-backed store
    Redis,
}

/// Persistent store configuration
#[derive(Debug, Config, Clone)]
pub struct StoreConfig {
    /// Store backend: "memory" or "redis" (default: "memory")
    #[config(env = "GUILDGATE_STORE_KIND", default = "memory")]
    pub kind: StoreKind,

    /// Redis connection URL, required when the backend is "redis"
    #[config(env = "GUILDGATE_STORE_REDIS_URL", default = "")]
    pub redis_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_kind_parses_lowercase() {
        let kind: StoreKind = serde_json::from_str("\"redis\"").unwrap();
        assert_eq!(kind, StoreKind::Redis);
        let kind: StoreKind = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(kind, StoreKind::Memory);
    }
}
