//! Client configuration schemas.
//!
//! All configuration structs are deserialized through the `config` crate
//! from an optional TOML file overlaid with `ORDERFEED__` environment
//! variables. Each sub-module represents one configuration section.

pub mod api;
pub mod live_feed;
pub mod logging;
pub mod push;
pub mod view;

use serde::{Deserialize, Serialize};

pub use self::api::ApiConfig;
pub use self::live_feed::LiveFeedConfig;
pub use self::logging::LoggingConfig;
pub use self::push::PushConfig;
pub use self::view::{ViewConfig, ViewScope};

use crate::error::AppError;

/// Root client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend REST settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Push subscription and delivery settings.
    #[serde(default)]
    pub push: PushConfig,
    /// Live feed (message bus) settings.
    #[serde(default)]
    pub live_feed: LiveFeedConfig,
    /// Which order list the client keeps in sync.
    #[serde(default)]
    pub view: ViewConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file and the environment.
    ///
    /// The file is optional; environment variables prefixed with
    /// `ORDERFEED__` (sections separated by `__`) override file values.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("ORDERFEED")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::configuration("api.base_url must not be empty"));
        }
        if self.push.enabled && self.push.vapid_public_key.trim().is_empty() {
            return Err(AppError::configuration(
                "push.vapid_public_key is required when push is enabled",
            ));
        }
        if self.view.scope == ViewScope::Restaurant && self.live_feed.restaurant_id.is_none() {
            tracing::warn!("Restaurant scope without live_feed.restaurant_id, live feed disabled");
        }
        Ok(())
    }
}
