//! Error body shape returned by the backend.

use serde::{Deserialize, Serialize};

/// Error response body. Only `message` is relied upon; the rest is informational.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Short error label.
    #[serde(default)]
    pub error: Option<String>,
    /// HTTP status echoed by the backend.
    #[serde(default)]
    pub status: Option<u16>,
}
