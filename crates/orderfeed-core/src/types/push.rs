//! Push subscription and notification permission types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform notification permission.
///
/// `Unsupported` is terminal. `Default` moves to `Granted` or `Denied`
/// through a one-shot prompt. `Denied` is sticky: the platform will not
/// prompt again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermissionState {
    /// The platform has no push capability.
    Unsupported,
    /// The user has not been asked yet.
    #[default]
    Default,
    /// Notifications are allowed.
    Granted,
    /// Notifications are blocked.
    Denied,
}

impl NotificationPermissionState {
    /// Whether a subscription may be created in this state.
    pub fn allows_subscription(self) -> bool {
        self == Self::Granted
    }
}

impl fmt::Display for NotificationPermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unsupported => "unsupported",
            Self::Default => "default",
            Self::Granted => "granted",
            Self::Denied => "denied",
        };
        f.write_str(s)
    }
}

/// Encryption keys of a push subscription, URL-safe base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    /// Client P-256 ECDH public key.
    pub p256dh: String,
    /// Client authentication secret.
    pub auth: String,
}

/// A platform push subscription for one device/profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscriptionDescriptor {
    /// Endpoint the backend delivers pushes to.
    pub endpoint: String,
    /// Encryption keys.
    pub keys: PushSubscriptionKeys,
}

/// Body of the idempotent "upsert subscription" call, keyed by endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionUpsert {
    /// Endpoint URL (the upsert key).
    pub endpoint: String,
    /// Client public key.
    pub p256dh: String,
    /// Client auth secret.
    pub auth: String,
}

impl From<&PushSubscriptionDescriptor> for SubscriptionUpsert {
    fn from(descriptor: &PushSubscriptionDescriptor) -> Self {
        Self {
            endpoint: descriptor.endpoint.clone(),
            p256dh: descriptor.keys.p256dh.clone(),
            auth: descriptor.keys.auth.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_serde_lowercase() {
        let json = serde_json::to_string(&NotificationPermissionState::Denied).expect("ser");
        assert_eq!(json, "\"denied\"");
        let parsed: NotificationPermissionState =
            serde_json::from_str("\"granted\"").expect("de");
        assert!(parsed.allows_subscription());
    }

    #[test]
    fn test_upsert_flattens_keys() {
        let descriptor = PushSubscriptionDescriptor {
            endpoint: "https://push.example/abc".to_string(),
            keys: PushSubscriptionKeys {
                p256dh: "BPk".to_string(),
                auth: "c2VjcmV0".to_string(),
            },
        };
        let body = serde_json::to_value(SubscriptionUpsert::from(&descriptor)).expect("ser");
        assert_eq!(body["endpoint"], "https://push.example/abc");
        assert_eq!(body["p256dh"], "BPk");
        assert_eq!(body["auth"], "c2VjcmV0");
    }
}
