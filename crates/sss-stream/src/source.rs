//! `LogSource` trait — abstraction over where log notifications come from.

use async_trait::async_trait;
use futures::Stream;
use sss_core::{LogNotification, StreamError};
use std::pin::Pin;
use tokio::sync::broadcast;
use tracing::warn;

/// A stream of log notifications for one program.
///
/// Dropping the stream releases the underlying subscription.
pub type LogStream = Pin<Box<dyn Stream<Item = Result<LogNotification, StreamError>> + Send>>;

/// Abstracts over different log transports.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Human-readable endpoint, used in logs.
    fn endpoint(&self) -> &str;

    /// Open a subscription. Resolves once the transport has confirmed it.
    async fn subscribe(&self) -> Result<LogStream, StreamError>;

    /// Returns `true` while a subscription is connected.
    fn is_connected(&self) -> bool;
}

/// In-process source fed by [`BroadcastLogSource::publish`].
///
/// Every `subscribe()` call gets its own receiver, so a listener can be
/// stopped and restarted against the same source. Used to replay captured
/// notifications and in tests.
#[derive(Debug, Clone)]
pub struct BroadcastLogSource {
    tx: broadcast::Sender<LogNotification>,
}

impl BroadcastLogSource {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Push a notification to every live subscription. Returns how many received it.
    pub fn publish(&self, notification: LogNotification) -> usize {
        self.tx.send(notification).unwrap_or(0)
    }
}

impl Default for BroadcastLogSource {
    fn default() -> Self {
        Self::new(1_024)
    }
}

#[async_trait]
impl LogSource for BroadcastLogSource {
    fn endpoint(&self) -> &str {
        "broadcast://local"
    }

    async fn subscribe(&self) -> Result<LogStream, StreamError> {
        let rx = self.tx.subscribe();
        let stream = futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(n) => return Some((Ok(n), rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "broadcast log source lagged, notifications dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(Box::pin(stream))
    }

    fn is_connected(&self) -> bool {
        self.tx.receiver_count() > 0
    }
}
