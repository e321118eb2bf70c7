//! `IndexerService` — wires source, listener, store, and dispatcher.

use crate::config::IndexerConfig;
use crate::error::IndexerError;
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::pipeline::EventPipeline;
use sss_store::sqlite::SqliteStore;
use sss_store::{AuditStore, MemoryStore, WebhookStore};
use sss_stream::{LogSource, LogStreamListener, SolanaWsLogSource};
use sss_webhook::WebhookDispatcher;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(1);

pub struct IndexerService {
    config: IndexerConfig,
    listener: LogStreamListener,
    pipeline: Arc<EventPipeline>,
    dispatcher: Arc<WebhookDispatcher>,
    audit: Arc<dyn AuditStore>,
}

impl IndexerService {
    /// Build the production service: WebSocket source plus SQLite (when
    /// `database_url` is set) or in-memory storage.
    pub async fn from_config(config: IndexerConfig) -> Result<Self, IndexerError> {
        config.validate()?;
        let program_id = config.program_pubkey()?;
        let source = Arc::new(SolanaWsLogSource::new(
            config.rpc_ws_url.clone(),
            &program_id,
            config.commitment,
        )?
        .with_subscribe_timeout(Duration::from_millis(config.subscribe_timeout_ms)));

        match config.database_url.clone() {
            Some(url) => {
                info!(database = %url, "using SQLite store");
                let store = Arc::new(SqliteStore::open(&url).await?);
                Self::with_parts(config, source, store.clone(), store)
            }
            None => {
                info!("no database_url configured, using in-memory store");
                let store = Arc::new(MemoryStore::new());
                Self::with_parts(config, source, store.clone(), store)
            }
        }
    }

    /// Build from explicit components.
    pub fn with_parts(
        config: IndexerConfig,
        source: Arc<dyn LogSource>,
        audit: Arc<dyn AuditStore>,
        webhooks: Arc<dyn WebhookStore>,
    ) -> Result<Self, IndexerError> {
        let program_id = config.program_pubkey()?;
        let dispatcher = Arc::new(WebhookDispatcher::new(webhooks, &config.webhook)?);
        let pipeline = Arc::new(EventPipeline::new(
            audit.clone(),
            dispatcher.clone(),
            Arc::new(PipelineMetrics::new()),
        ));
        Ok(Self {
            listener: LogStreamListener::new(source, &program_id),
            config,
            pipeline,
            dispatcher,
            audit,
        })
    }

    /// Register the config file's subscribers, skipping URLs already present.
    pub async fn register_configured_subscribers(&self) -> Result<usize, IndexerError> {
        let existing = self.dispatcher.list().await?;
        let mut added = 0;
        for sub in &self.config.subscribers {
            if existing.iter().any(|h| h.url == sub.url) {
                continue;
            }
            self.dispatcher
                .register(&sub.url, sub.events.clone(), sub.secret.clone())
                .await?;
            added += 1;
        }
        Ok(added)
    }

    pub async fn start(&self) -> Result<(), IndexerError> {
        self.listener.start(self.pipeline.clone()).await?;
        info!(
            rpc = %self.config.rpc_ws_url,
            program = %self.config.program_id,
            commitment = %self.config.commitment,
            "indexer started"
        );
        Ok(())
    }

    pub async fn stop(&self) {
        self.listener.stop().await;
        info!(metrics = ?self.metrics(), "indexer stopped");
    }

    /// Start, then run until Ctrl-C or until the subscription ends.
    ///
    /// A lost subscription is returned as an error; restarting is left to
    /// the process supervisor.
    pub async fn run(&self) -> Result<(), IndexerError> {
        self.register_configured_subscribers().await?;
        self.start().await?;

        let mut health = tokio::time::interval(HEALTH_CHECK_INTERVAL);
        let outcome = loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested");
                    break Ok(());
                }
                _ = health.tick() => {
                    if !self.listener.is_running() {
                        let reason = self
                            .listener
                            .last_error()
                            .unwrap_or_else(|| "subscription ended".to_string());
                        error!(reason = %reason, "log subscription lost");
                        break Err(IndexerError::Stream(sss_core::StreamError::Other(reason)));
                    }
                }
            }
        };

        self.stop().await;
        outcome
    }

    pub fn is_running(&self) -> bool {
        self.listener.is_running()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.pipeline.metrics().snapshot()
    }

    pub fn audit(&self) -> &Arc<dyn AuditStore> {
        &self.audit
    }

    pub fn dispatcher(&self) -> &Arc<WebhookDispatcher> {
        &self.dispatcher
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }
}
