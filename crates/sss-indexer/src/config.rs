//! Indexer configuration.
//!
//! Loaded from YAML; a handful of deployment-specific keys can be
//! overridden from the environment:
//!
//! | Key | Env var |
//! |---|---|
//! | `rpc_ws_url` | `SSS_RPC_WS_URL` |
//! | `program_id` | `SSS_PROGRAM_ID` |
//! | `database_url` | `SSS_DATABASE_URL` |

use crate::error::IndexerError;
use crate::tracing_setup::LogConfig;
use serde::{Deserialize, Serialize};
use sss_codec::constants::SSS_TOKEN_PROGRAM_ID;
use sss_core::Pubkey;
use sss_stream::Commitment;
use sss_webhook::DispatcherConfig;
use std::path::Path;

pub const ENV_RPC_WS_URL: &str = "SSS_RPC_WS_URL";
pub const ENV_PROGRAM_ID: &str = "SSS_PROGRAM_ID";
pub const ENV_DATABASE_URL: &str = "SSS_DATABASE_URL";

/// A webhook subscriber declared in the config file, registered at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberConfig {
    pub url: String,
    #[serde(default = "wildcard")]
    pub events: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

fn wildcard() -> Vec<String> { vec![sss_core::WILDCARD.to_string()] }

/// Top-level indexer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Solana WebSocket RPC endpoint, e.g. "wss://api.devnet.solana.com"
    #[serde(default = "default_rpc_ws_url")]
    pub rpc_ws_url: String,
    /// Program whose events are indexed (base58)
    #[serde(default = "default_program_id")]
    pub program_id: String,
    #[serde(default)]
    pub commitment: Commitment,
    /// Bound on connecting and confirming the log subscription
    #[serde(default = "default_subscribe_timeout_ms")]
    pub subscribe_timeout_ms: u64,
    /// SQLite path or URL; unset = in-memory store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    #[serde(default)]
    pub webhook: DispatcherConfig,
    #[serde(default)]
    pub subscribers: Vec<SubscriberConfig>,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_rpc_ws_url() -> String { "ws://127.0.0.1:8900".into() }
fn default_program_id() -> String { SSS_TOKEN_PROGRAM_ID.to_string() }
fn default_subscribe_timeout_ms() -> u64 { sss_stream::ws::DEFAULT_SUBSCRIBE_TIMEOUT.as_millis() as u64 }

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            rpc_ws_url: default_rpc_ws_url(),
            program_id: default_program_id(),
            commitment: Commitment::default(),
            subscribe_timeout_ms: default_subscribe_timeout_ms(),
            database_url: None,
            webhook: DispatcherConfig::default(),
            subscribers: vec![],
            log: LogConfig::default(),
        }
    }
}

impl IndexerConfig {
    /// Default config pointed at a single endpoint.
    pub fn for_endpoint(rpc_ws_url: impl Into<String>) -> Self {
        Self {
            rpc_ws_url: rpc_ws_url.into(),
            ..Self::default()
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, IndexerError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read `path` and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IndexerError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| IndexerError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_yaml(&yaml)?.with_env())
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_RPC_WS_URL) {
            self.rpc_ws_url = url;
        }
        if let Some(id) = get(ENV_PROGRAM_ID) {
            self.program_id = id;
        }
        if let Some(db) = get(ENV_DATABASE_URL) {
            self.database_url = Some(db);
        }
        self
    }

    pub fn program_pubkey(&self) -> Result<Pubkey, IndexerError> {
        Ok(self.program_id.parse::<Pubkey>()?)
    }

    /// Reject values that would only fail later at connect time.
    pub fn validate(&self) -> Result<(), IndexerError> {
        self.program_pubkey()?;
        if !(self.rpc_ws_url.starts_with("ws://") || self.rpc_ws_url.starts_with("wss://")) {
            return Err(IndexerError::Config(format!(
                "rpc_ws_url must be a ws:// or wss:// URL, got '{}'",
                self.rpc_ws_url
            )));
        }
        if self.webhook.max_concurrency == 0 {
            return Err(IndexerError::Config("webhook.max_concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_from_empty_yaml() {
        let cfg = IndexerConfig::from_yaml("{}").unwrap();
        assert_eq!(cfg.program_id, "2D8s3bH6vD3LG7wqzvpSvYFysYoSK4wwggHCptaKFJJQ");
        assert_eq!(cfg.commitment, Commitment::Confirmed);
        assert_eq!(cfg.webhook.request_timeout_ms, 10_000);
        assert_eq!(cfg.webhook.max_concurrency, 8);
        assert_eq!(cfg.subscribe_timeout_ms, 10_000);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.log.level, "info");
        cfg.validate().unwrap();
    }

    #[test]
    fn full_yaml() {
        let yaml = r#"
rpc_ws_url: wss://api.devnet.solana.com
commitment: finalized
subscribe_timeout_ms: 3000
database_url: ./audit.db
webhook:
  request_timeout_ms: 2500
  max_concurrency: 2
subscribers:
  - url: https://hooks.example.com/sss
    events: [TokensMinted, TokensBurned]
    secret: s3cret
  - url: https://all.example.com
log:
  level: debug
  json: true
  components:
    sss-stream: trace
"#;
        let cfg = IndexerConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.commitment, Commitment::Finalized);
        assert_eq!(cfg.subscribe_timeout_ms, 3000);
        assert_eq!(cfg.database_url.as_deref(), Some("./audit.db"));
        assert_eq!(cfg.webhook.request_timeout_ms, 2500);
        assert_eq!(cfg.subscribers.len(), 2);
        assert_eq!(cfg.subscribers[0].secret.as_deref(), Some("s3cret"));
        assert_eq!(cfg.subscribers[1].events, vec!["*".to_string()]);
        assert!(cfg.log.json);
        assert_eq!(cfg.log.components["sss-stream"], "trace");
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            (ENV_RPC_WS_URL, "wss://rpc.example.com"),
            (ENV_DATABASE_URL, "sqlite:./x.db"),
            (ENV_PROGRAM_ID, "   "),
        ]
        .into_iter()
        .collect();
        let cfg = IndexerConfig::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.rpc_ws_url, "wss://rpc.example.com");
        assert_eq!(cfg.database_url.as_deref(), Some("sqlite:./x.db"));
        assert_eq!(cfg.program_id, default_program_id());
    }

    #[test]
    fn validation_errors() {
        let mut cfg = IndexerConfig::for_endpoint("https://not-a-ws.example.com");
        assert!(matches!(cfg.validate(), Err(IndexerError::Config(_))));

        cfg.rpc_ws_url = "ws://localhost:8900".into();
        cfg.program_id = "not-base58!".into();
        assert!(matches!(cfg.validate(), Err(IndexerError::Codec(_))));
    }
}
