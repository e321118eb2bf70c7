//! `WebhookDispatcher` — registration CRUD and event fan-out.
//!
//! Each matching registration gets one POST per dispatch. Deliveries run
//! concurrently up to `max_concurrency`; every outcome is logged on its own
//! and one subscriber's failure never cancels another's delivery. There is
//! no retry.

use crate::signature::{sign, EVENT_HEADER, SIGNATURE_HEADER};
use chrono::Utc;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use sss_core::{EventKind, WebhookError, WebhookRegistration, WILDCARD};
use sss_store::WebhookStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// HTTP delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Maximum deliveries in flight for one dispatch
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_request_timeout_ms() -> u64 { 10_000 }
fn default_max_concurrency() -> usize { 8 }

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Outcome counts of one `dispatch` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Registrations a delivery was attempted for
    pub attempted: usize,
    /// 2xx responses
    pub delivered: usize,
    /// Non-2xx responses and transport errors
    pub failed: usize,
}

pub struct WebhookDispatcher {
    store: Arc<dyn WebhookStore>,
    http: reqwest::Client,
    max_concurrency: usize,
}

impl WebhookDispatcher {
    pub fn new(store: Arc<dyn WebhookStore>, config: &DispatcherConfig) -> Result<Self, WebhookError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| WebhookError::Transport {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            store,
            http,
            max_concurrency: config.max_concurrency.max(1),
        })
    }

    // ─── Registration CRUD ───────────────────────────────────────────────────

    /// Register a subscriber. `events` holds event names or `"*"`.
    pub async fn register(
        &self,
        url: &str,
        events: Vec<String>,
        secret: Option<String>,
    ) -> Result<Uuid, WebhookError> {
        validate_url(url)?;
        validate_events(&events)?;

        let hook = WebhookRegistration::new(url, events, secret.filter(|s| !s.is_empty()));
        self.store.insert_webhook(&hook).await?;
        info!(id = %hook.id, url, events = ?hook.events, "webhook registered");
        Ok(hook.id)
    }

    pub async fn list(&self) -> Result<Vec<WebhookRegistration>, WebhookError> {
        Ok(self.store.list_webhooks().await?)
    }

    /// `Ok(false)` if no registration has that id.
    pub async fn remove(&self, id: Uuid) -> Result<bool, WebhookError> {
        let removed = self.store.remove_webhook(id).await?;
        if removed {
            info!(%id, "webhook removed");
        }
        Ok(removed)
    }

    /// `Ok(false)` if no registration has that id.
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<bool, WebhookError> {
        let found = self.store.set_webhook_active(id, active).await?;
        if found {
            info!(%id, active, "webhook active flag updated");
        }
        Ok(found)
    }

    // ─── Delivery ────────────────────────────────────────────────────────────

    /// Deliver `payload` to every active registration subscribed to `event_type`.
    ///
    /// Never fails: per-subscriber errors are logged and counted.
    pub async fn dispatch(&self, event_type: &str, payload: &serde_json::Value) -> DispatchReport {
        let hooks = match self.store.list_webhooks().await {
            Ok(hooks) => hooks,
            Err(e) => {
                error!(event = event_type, error = %e, "cannot load webhook registrations");
                return DispatchReport::default();
            }
        };

        let targets: Vec<WebhookRegistration> =
            hooks.into_iter().filter(|h| h.wants(event_type)).collect();
        if targets.is_empty() {
            debug!(event = event_type, "no webhook subscribers");
            return DispatchReport::default();
        }

        let body = serde_json::json!({
            "event": event_type,
            "data": payload,
            "timestamp": Utc::now().to_rfc3339(),
        })
        .to_string();

        let body: Arc<str> = body.into();
        let deliveries: Vec<_> = targets
            .into_iter()
            .map(|hook| {
                let http = self.http.clone();
                let event_type = event_type.to_owned();
                let body = Arc::clone(&body);
                async move {
                    match deliver(&http, &hook, &event_type, &body).await {
                        Ok(()) => {
                            debug!(id = %hook.id, url = %hook.url, event = %event_type, "webhook delivered");
                            true
                        }
                        Err(e) => {
                            warn!(id = %hook.id, event = %event_type, error = %e, "webhook delivery failed");
                            false
                        }
                    }
                }
            })
            .collect();

        let outcomes: Vec<bool> = futures::stream::iter(deliveries)
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let delivered = outcomes.iter().filter(|ok| **ok).count();
        DispatchReport {
            attempted: outcomes.len(),
            delivered,
            failed: outcomes.len() - delivered,
        }
    }
}

async fn deliver(
    http: &reqwest::Client,
    hook: &WebhookRegistration,
    event_type: &str,
    body: &str,
) -> Result<(), WebhookError> {
    let mut request = http
        .post(&hook.url)
        .header(CONTENT_TYPE, "application/json")
        .header(EVENT_HEADER, event_type);
    if let Some(secret) = &hook.secret {
        request = request.header(SIGNATURE_HEADER, sign(secret.as_bytes(), body.as_bytes()));
    }

    let response = request
        .body(body.to_owned())
        .send()
        .await
        .map_err(|e| WebhookError::Transport {
            url: hook.url.clone(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(WebhookError::Status {
            url: hook.url.clone(),
            status: status.as_u16(),
        })
    }
}

fn validate_url(raw: &str) -> Result<(), WebhookError> {
    let parsed = url::Url::parse(raw).map_err(|e| WebhookError::InvalidUrl {
        url: raw.into(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(WebhookError::InvalidUrl {
            url: raw.into(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn validate_events(events: &[String]) -> Result<(), WebhookError> {
    if events.is_empty() {
        return Err(WebhookError::InvalidEvents {
            reason: "at least one event type (or \"*\") is required".into(),
        });
    }
    for name in events {
        if name != WILDCARD && name.parse::<EventKind>().is_err() {
            return Err(WebhookError::InvalidEvents {
                reason: format!("unknown event type '{name}'"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::verify;
    use sss_store::MemoryStore;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher() -> WebhookDispatcher {
        let config = DispatcherConfig {
            request_timeout_ms: 500,
            max_concurrency: 4,
        };
        WebhookDispatcher::new(Arc::new(MemoryStore::new()), &config).unwrap()
    }

    fn payload() -> serde_json::Value {
        serde_json::json!({ "amount": "1000000", "burner": "8qbHbw2BbbTHBW1sbeqakYXVKRQM8Ne7pLK7m6CVfeR" })
    }

    #[tokio::test]
    async fn rejects_invalid_registrations() {
        let d = dispatcher();
        assert!(matches!(
            d.register("ftp://x", vec!["*".into()], None).await,
            Err(WebhookError::InvalidUrl { .. })
        ));
        assert!(matches!(
            d.register("not a url", vec!["*".into()], None).await,
            Err(WebhookError::InvalidUrl { .. })
        ));
        assert!(matches!(
            d.register("https://x.example", vec![], None).await,
            Err(WebhookError::InvalidEvents { .. })
        ));
        assert!(matches!(
            d.register("https://x.example", vec!["TokensTeleported".into()], None).await,
            Err(WebhookError::InvalidEvents { .. })
        ));
        assert!(d.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn crud_roundtrip() {
        let d = dispatcher();
        let id = d
            .register("https://x.example/hook", vec!["TokensMinted".into()], Some("k".into()))
            .await
            .unwrap();
        assert_eq!(d.list().await.unwrap()[0].id, id);
        assert!(d.set_active(id, false).await.unwrap());
        assert!(d.remove(id).await.unwrap());
        assert!(!d.remove(id).await.unwrap());
    }

    #[tokio::test]
    async fn delivers_body_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("X-SSS-Event", "TokensBurned"))
            .and(header("content-type", "application/json"))
            .and(header_exists("X-SSS-Signature"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let d = dispatcher();
        d.register(&format!("{}/hook", server.uri()), vec!["*".into()], Some("s3cret".into()))
            .await
            .unwrap();

        let report = d.dispatch("TokensBurned", &payload()).await;
        assert_eq!(report, DispatchReport { attempted: 1, delivered: 1, failed: 0 });

        let requests = server.received_requests().await.unwrap();
        let req = &requests[0];
        let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
        assert_eq!(body["event"], "TokensBurned");
        assert_eq!(body["data"], payload());
        assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());

        let sig = req.headers.get("X-SSS-Signature").unwrap().to_str().unwrap();
        assert!(verify(b"s3cret", &req.body, sig));
    }

    #[tokio::test]
    async fn unsigned_when_no_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let d = dispatcher();
        d.register(&server.uri(), vec!["TokensMinted".into()], None).await.unwrap();
        let report = d.dispatch("TokensMinted", &payload()).await;
        assert_eq!(report.delivered, 1);

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("X-SSS-Signature").is_none());
    }

    #[tokio::test]
    async fn subscription_filtering() {
        let minted_only = MockServer::start().await;
        let everything = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&minted_only)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&everything)
            .await;

        let d = dispatcher();
        d.register(&minted_only.uri(), vec!["TokensMinted".into()], None).await.unwrap();
        d.register(&everything.uri(), vec!["*".into()], None).await.unwrap();

        let report = d.dispatch("TokensBurned", &payload()).await;
        assert_eq!(report.attempted, 1);
        assert_eq!(report.delivered, 1);
    }

    #[tokio::test]
    async fn inactive_registrations_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let d = dispatcher();
        let id = d.register(&server.uri(), vec!["*".into()], None).await.unwrap();
        d.set_active(id, false).await.unwrap();

        assert_eq!(d.dispatch("TokensMinted", &payload()).await, DispatchReport::default());
    }

    #[tokio::test]
    async fn one_failing_subscriber_does_not_block_others() {
        let healthy = MockServer::start().await;
        let broken = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&healthy)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&broken)
            .await;

        let d = dispatcher();
        d.register(&healthy.uri(), vec!["*".into()], None).await.unwrap();
        d.register(&broken.uri(), vec!["*".into()], None).await.unwrap();
        // Nothing listens on port 9 (discard); connection is refused.
        d.register("http://127.0.0.1:9/hook", vec!["*".into()], None).await.unwrap();
        d.register(&format!("{}/again", healthy.uri()), vec!["*".into()], None).await.unwrap();

        let report = d.dispatch("TokensSeized", &payload()).await;
        assert_eq!(report, DispatchReport { attempted: 4, delivered: 2, failed: 2 });
    }

    #[tokio::test]
    async fn dispatch_from_a_spawned_task() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let d = Arc::new(dispatcher());
        d.register(&server.uri(), vec!["*".into()], None).await.unwrap();
        d.register(&format!("{}/second", server.uri()), vec!["*".into()], None)
            .await
            .unwrap();

        let task = tokio::spawn({
            let d = Arc::clone(&d);
            async move { d.dispatch("TokensMinted", &payload()).await }
        });
        let report = task.await.unwrap();
        assert_eq!(report, DispatchReport { attempted: 2, delivered: 2, failed: 0 });
    }

    #[tokio::test]
    async fn slow_subscriber_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let d = dispatcher();
        d.register(&server.uri(), vec!["*".into()], None).await.unwrap();
        let report = d.dispatch("AccountFrozen", &payload()).await;
        assert_eq!(report.failed, 1);
    }
}
