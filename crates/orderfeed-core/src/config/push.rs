//! Push subscription and delivery configuration.

use serde::{Deserialize, Serialize};

/// Push notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Whether the client attempts to subscribe at all.
    #[serde(default)]
    pub enabled: bool,
    /// Application server (VAPID) public key, URL-safe base64 without padding.
    #[serde(default)]
    pub vapid_public_key: String,
    /// Push distributor base URL. Absent means the platform has no push capability.
    #[serde(default)]
    pub distributor_url: Option<String>,
    /// File holding the platform permission and subscription state.
    #[serde(default = "default_state_file")]
    pub state_file: String,
    /// Address the local push relay listens on.
    #[serde(default = "default_relay_bind")]
    pub relay_bind: String,
    /// Origin notification click targets are resolved against.
    #[serde(default = "default_app_origin")]
    pub app_origin: String,
    /// Icon shown with rendered notifications.
    #[serde(default = "default_icon")]
    pub icon: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            vapid_public_key: String::new(),
            distributor_url: None,
            state_file: default_state_file(),
            relay_bind: default_relay_bind(),
            app_origin: default_app_origin(),
            icon: default_icon(),
        }
    }
}

fn default_state_file() -> String {
    "data/push-state.json".to_string()
}

fn default_relay_bind() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_app_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_icon() -> String {
    "/logo192.png".to_string()
}
