//! Indexer-level errors: configuration plus the component errors it wires together.

use sss_core::{CodecError, StoreError, StreamError, WebhookError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cannot read config file {path}: {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),
}
