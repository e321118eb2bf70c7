//! Webhook registration record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription entry matching every event type.
pub const WILDCARD: &str = "*";

/// A registered external subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRegistration {
    pub id: Uuid,
    /// Destination URL (http / https)
    pub url: String,
    /// Subscribed event names, or `["*"]` for all
    pub events: Vec<String>,
    /// Shared secret used to sign deliveries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl WebhookRegistration {
    /// Create a new, active registration with a fresh id.
    pub fn new(url: impl Into<String>, events: Vec<String>, secret: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            events,
            secret,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if this registration subscribes to `event_type`.
    pub fn subscribes_to(&self, event_type: &str) -> bool {
        self.events
            .iter()
            .any(|e| e == WILDCARD || e == event_type)
    }

    /// Active and subscribed.
    pub fn wants(&self, event_type: &str) -> bool {
        self.active && self.subscribes_to(event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_subscription() {
        let hook = WebhookRegistration::new("http://x", vec!["TokensMinted".into()], None);
        assert!(hook.wants("TokensMinted"));
        assert!(!hook.wants("TokensBurned"));
    }

    #[test]
    fn wildcard_subscription() {
        let hook = WebhookRegistration::new("http://x", vec![WILDCARD.into()], None);
        assert!(hook.wants("TokensBurned"));
    }

    #[test]
    fn inactive_never_wants() {
        let mut hook = WebhookRegistration::new("http://x", vec![WILDCARD.into()], None);
        hook.active = false;
        assert!(!hook.wants("TokensMinted"));
        assert!(hook.subscribes_to("TokensMinted"));
    }
}
