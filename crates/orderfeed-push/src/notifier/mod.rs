//! The delivery context and the messages it exchanges.
//!
//! The delivery context runs independently of any foreground view and shares
//! no state with them. Inbound pushes reach it through a [`DeliveryHandle`];
//! views hear from it only through messages posted via the [`ClientRegistry`].

pub mod context;
pub mod registry;
pub mod surface;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use context::{DeliveryContext, DeliveryHandle};
pub use registry::{ClientHandle, ClientRegistry};
pub use surface::{LogSurface, NotificationOptions, NotificationSurface};

/// Title used when a push arrives without a readable payload.
pub const FALLBACK_TITLE: &str = "Error";
/// Body used when a push arrives without a readable payload.
pub const FALLBACK_BODY: &str = "payload unavailable";

/// Message posted from the delivery context to foreground clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Server state may have changed; receivers re-fetch.
    #[serde(rename = "push-update")]
    PushUpdate,
}

/// Inbound push body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
}

impl PushPayload {
    /// Parse an inbound push body, falling back to a placeholder when the
    /// body is absent or unreadable.
    pub fn parse(data: Option<&[u8]>) -> Self {
        let Some(bytes) = data.filter(|b| !b.is_empty()) else {
            warn!("Push arrived without a payload");
            return Self::fallback();
        };
        serde_json::from_slice(bytes).unwrap_or_else(|e| {
            warn!(error = %e, "Push payload is malformed");
            Self::fallback()
        })
    }

    /// The placeholder payload.
    pub fn fallback() -> Self {
        Self {
            title: FALLBACK_TITLE.to_string(),
            body: FALLBACK_BODY.to_string(),
        }
    }
}

/// Data attached to a rendered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Deep-link target opened on click.
    #[serde(default = "default_url")]
    pub url: String,
}

impl Default for NotificationData {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

fn default_url() -> String {
    "/".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wake_signal_wire_shape() {
        let json = serde_json::to_value(ClientMessage::PushUpdate).expect("ser");
        assert_eq!(json, serde_json::json!({"type": "push-update"}));
    }

    #[test]
    fn test_payload_parse() {
        let payload = PushPayload::parse(Some(
            br#"{"title":"Order Update","body":"Your order is on the way"}"#,
        ));
        assert_eq!(payload.title, "Order Update");
        assert_eq!(payload.body, "Your order is on the way");
    }

    #[test]
    fn test_absent_or_malformed_payload_falls_back() {
        assert_eq!(PushPayload::parse(None), PushPayload::fallback());
        assert_eq!(PushPayload::parse(Some(b"")), PushPayload::fallback());
        assert_eq!(PushPayload::parse(Some(b"{not json")), PushPayload::fallback());
        assert_eq!(
            PushPayload::parse(Some(br#"{"title":"only a title"}"#)),
            PushPayload::fallback()
        );
    }

    #[test]
    fn test_notification_data_defaults_to_root() {
        let data: NotificationData = serde_json::from_str("{}").expect("de");
        assert_eq!(data.url, "/");
    }
}
