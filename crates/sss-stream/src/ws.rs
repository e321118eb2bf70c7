//! `SolanaWsLogSource` — `LogSource` over a Solana JSON-RPC WebSocket
//! subscription (`logsSubscribe` with a `mentions` filter).
//!
//! # Usage
//! ```no_run
//! use sss_stream::ws::{Commitment, SolanaWsLogSource};
//! use sss_codec::constants::SSS_TOKEN_PROGRAM_ID;
//!
//! let source = SolanaWsLogSource::new(
//!     "wss://api.devnet.solana.com",
//!     &SSS_TOKEN_PROGRAM_ID,
//!     Commitment::Confirmed,
//! ).unwrap();
//! ```

use crate::source::{LogSource, LogStream};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sss_core::{LogNotification, Pubkey, StreamError};
use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

const SUBSCRIBE_ID: u64 = 1;
const UNSUBSCRIBE_ID: u64 = 2;

/// How long `subscribe()` waits for the connect + confirmation handshake.
pub const DEFAULT_SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Commitment level requested for the log subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Solana WebSocket log subscription for a single program.
pub struct SolanaWsLogSource {
    rpc_url: String,
    program_id: String,
    commitment: Commitment,
    subscribe_timeout: Duration,
    connected: Arc<AtomicBool>,
}

impl SolanaWsLogSource {
    /// `rpc_url` must be a `ws://` or `wss://` URL.
    pub fn new(
        rpc_url: impl Into<String>,
        program_id: &Pubkey,
        commitment: Commitment,
    ) -> Result<Self, StreamError> {
        let rpc_url = rpc_url.into();
        let parsed = url::Url::parse(&rpc_url).map_err(|e| StreamError::ConnectionFailed {
            url: rpc_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(StreamError::ConnectionFailed {
                url: rpc_url,
                reason: format!("unsupported scheme '{}', expected ws or wss", parsed.scheme()),
            });
        }
        Ok(Self {
            rpc_url,
            program_id: program_id.to_string(),
            commitment,
            subscribe_timeout: DEFAULT_SUBSCRIBE_TIMEOUT,
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Bound on the connect + `logsSubscribe` confirmation handshake.
    pub fn with_subscribe_timeout(mut self, timeout: Duration) -> Self {
        self.subscribe_timeout = timeout;
        self
    }
}

#[async_trait]
impl LogSource for SolanaWsLogSource {
    fn endpoint(&self) -> &str {
        &self.rpc_url
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn subscribe(&self) -> Result<LogStream, StreamError> {
        let (tx, rx) = mpsc::channel::<Result<LogNotification, StreamError>>(512);
        let (ready_tx, ready_rx) = oneshot::channel();

        let task = tokio::spawn(run_ws_subscription(
            self.rpc_url.clone(),
            subscribe_request(&self.program_id, self.commitment),
            Arc::clone(&self.connected),
            tx,
            ready_tx,
        ));

        match tokio::time::timeout(self.subscribe_timeout, ready_rx).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => return Err(e),
            Ok(Err(_)) => return Err(StreamError::Closed),
            Err(_) => {
                task.abort();
                self.connected.store(false, Ordering::Relaxed);
                warn!(timeout_ms = self.subscribe_timeout.as_millis() as u64, "logsSubscribe not confirmed in time");
                return Err(StreamError::ConnectionFailed {
                    url: self.rpc_url.clone(),
                    reason: format!(
                        "subscription not confirmed within {}ms",
                        self.subscribe_timeout.as_millis()
                    ),
                });
            }
        }

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Box::pin(stream))
    }
}

// ─── Internal WebSocket loop ──────────────────────────────────────────────────

/// Reports a failure to whoever is waiting: the `subscribe()` caller before
/// confirmation, the stream consumer after.
async fn report(
    ready: &mut Option<oneshot::Sender<Result<(), StreamError>>>,
    tx: &mpsc::Sender<Result<LogNotification, StreamError>>,
    err: StreamError,
) {
    match ready.take() {
        Some(ready) => {
            let _ = ready.send(Err(err));
        }
        None => {
            let _ = tx.send(Err(err)).await;
        }
    }
}

async fn run_ws_subscription(
    rpc_url: String,
    request: Value,
    connected: Arc<AtomicBool>,
    tx: mpsc::Sender<Result<LogNotification, StreamError>>,
    ready: oneshot::Sender<Result<(), StreamError>>,
) {
    let mut ready = Some(ready);
    info!("Connecting to WebSocket: {}", rpc_url);

    let ws_stream = match connect_async(&rpc_url).await {
        Ok((ws, _)) => {
            connected.store(true, Ordering::Relaxed);
            info!("WebSocket connected: {}", rpc_url);
            ws
        }
        Err(e) => {
            error!("WebSocket connect failed: {}", e);
            let err = StreamError::ConnectionFailed {
                url: rpc_url.clone(),
                reason: e.to_string(),
            };
            report(&mut ready, &tx, err).await;
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    if let Err(e) = write.send(Message::Text(request.to_string())).await {
        error!("Failed to send logsSubscribe: {}", e);
        connected.store(false, Ordering::Relaxed);
        report(&mut ready, &tx, StreamError::Closed).await;
        return;
    }

    let mut subscription: Option<u64> = None;
    loop {
        let msg = tokio::select! {
            _ = tx.closed() => {
                // Consumer dropped the stream: release the subscription.
                if let Some(id) = subscription {
                    info!(subscription = id, "unsubscribing from program logs");
                    let _ = write.send(Message::Text(unsubscribe_request(id).to_string())).await;
                }
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            msg = read.next() => msg,
        };

        match msg {
            None => {
                info!("WebSocket stream ended");
                report(&mut ready, &tx, StreamError::Closed).await;
                break;
            }
            Some(Err(e)) => {
                warn!("WebSocket error: {}", e);
                report(&mut ready, &tx, StreamError::Other(e.to_string())).await;
                break;
            }
            Some(Ok(Message::Text(text))) => {
                debug!("WS message: {}", text.get(..120).unwrap_or(text.as_str()));
                match parse_message(&text) {
                    WsMessage::Confirmed(id) => {
                        info!(subscription = id, "logsSubscribe confirmed");
                        subscription = Some(id);
                        if let Some(ready) = ready.take() {
                            let _ = ready.send(Ok(()));
                        }
                    }
                    WsMessage::Rejected(reason) => {
                        error!("logsSubscribe rejected: {}", reason);
                        report(&mut ready, &tx, StreamError::SubscriptionRejected { reason }).await;
                        break;
                    }
                    WsMessage::Notification(n) => {
                        if tx.send(Ok(n)).await.is_err() {
                            // Receiver dropped; next iteration unsubscribes.
                            continue;
                        }
                    }
                    WsMessage::Other => {}
                }
            }
            Some(Ok(Message::Close(_))) => {
                info!("WebSocket closed by server");
                report(&mut ready, &tx, StreamError::Closed).await;
                break;
            }
            Some(Ok(Message::Ping(data))) => {
                let _ = write.send(Message::Pong(data)).await;
            }
            Some(Ok(_)) => {} // binary / pong / frame
        }
    }

    connected.store(false, Ordering::Relaxed);
    info!("WebSocket subscription loop ended");
}

// ─── Message building / parsing ───────────────────────────────────────────────

fn subscribe_request(program_id: &str, commitment: Commitment) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": SUBSCRIBE_ID,
        "method": "logsSubscribe",
        "params": [
            { "mentions": [program_id] },
            { "commitment": commitment.as_str() }
        ]
    })
}

fn unsubscribe_request(subscription: u64) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": UNSUBSCRIBE_ID,
        "method": "logsUnsubscribe",
        "params": [subscription]
    })
}

#[derive(Debug, PartialEq)]
enum WsMessage {
    Confirmed(u64),
    Rejected(String),
    Notification(LogNotification),
    Other,
}

fn parse_message(text: &str) -> WsMessage {
    let Ok(v) = serde_json::from_str::<Value>(text) else {
        return WsMessage::Other;
    };

    if v.get("method").and_then(Value::as_str) == Some("logsNotification") {
        return parse_notification(&v).map_or(WsMessage::Other, WsMessage::Notification);
    }

    if v.get("id").and_then(Value::as_u64) == Some(SUBSCRIBE_ID) {
        if let Some(err) = v.get("error") {
            let reason = err
                .get("message")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| err.to_string());
            return WsMessage::Rejected(reason);
        }
        if let Some(id) = v.get("result").and_then(Value::as_u64) {
            return WsMessage::Confirmed(id);
        }
    }
    WsMessage::Other
}

fn parse_notification(v: &Value) -> Option<LogNotification> {
    let result = v.get("params")?.get("result")?;
    let slot = result.get("context")?.get("slot")?.as_u64()?;
    let value = result.get("value")?;

    let signature = value.get("signature")?.as_str()?.to_string();
    let err = value.get("err").filter(|e| !e.is_null()).cloned();
    let logs = value
        .get("logs")
        .and_then(Value::as_array)
        .map(|lines| {
            lines
                .iter()
                .filter_map(|l| l.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    Some(LogNotification {
        signature,
        slot,
        err,
        logs,
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
