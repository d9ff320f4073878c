//! Live feed (message bus) configuration.

use serde::{Deserialize, Serialize};

/// Message bus connection settings for the live order feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveFeedConfig {
    /// WebSocket endpoint speaking STOMP.
    #[serde(default = "default_url")]
    pub url: String,
    /// Restaurant identity whose topic is subscribed. No identity, no feed.
    #[serde(default)]
    pub restaurant_id: Option<i64>,
    /// Handshake timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Heart-beat interval asked of the server in the CONNECT frame, in
    /// milliseconds. Two missed heart-beats fail the feed. Zero disables both.
    #[serde(default = "default_heartbeat")]
    pub heartbeat_ms: u64,
    /// Capacity of the feed event broadcast channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for LiveFeedConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            restaurant_id: None,
            connect_timeout_seconds: default_connect_timeout(),
            heartbeat_ms: default_heartbeat(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_url() -> String {
    "ws://localhost:8080/ws".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_heartbeat() -> u64 {
    10_000
}

fn default_event_buffer() -> usize {
    64
}
