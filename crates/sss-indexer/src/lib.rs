//! # sss-indexer
//!
//! Live indexer for the SSS token program.
//!
//! ```text
//! SolanaWsLogSource ─► LogStreamListener ─► EventPipeline ─┬─► AuditStore (event + operation)
//!                                                           └─► WebhookDispatcher
//! ```
//!
//! # Quick start
//! ```no_run
//! # async fn example() -> Result<(), sss_indexer::IndexerError> {
//! use sss_indexer::{init_tracing, IndexerConfig, IndexerService};
//!
//! let config = IndexerConfig::load("indexer.yaml")?;
//! init_tracing(&config.log);
//! IndexerService::from_config(config).await?.run().await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod service;
pub mod tracing_setup;

pub use config::{IndexerConfig, SubscriberConfig};
pub use error::IndexerError;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{webhook_payload, EventPipeline};
pub use service::IndexerService;
pub use tracing_setup::{init_tracing, LogConfig};
