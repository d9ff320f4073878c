//! File-backed push platform bound to a push distributor.
//!
//! The distributor forwards pushes for every endpoint it minted to the local
//! relay. Permission and subscription live in a small JSON state file that is
//! re-read on every query, so edits made outside the process (for example
//! clearing a denied permission) take effect immediately.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use p256::SecretKey;
use p256::elliptic_curve::rand_core::OsRng;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use orderfeed_core::config::PushConfig;
use orderfeed_core::error::{AppError, ErrorKind};
use orderfeed_core::result::AppResult;
use orderfeed_core::types::{
    NotificationPermissionState, PushSubscriptionDescriptor, PushSubscriptionKeys,
};

use super::{PermissionPrompt, PushPlatform};
use crate::codec::encode_key;

/// Persisted platform state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PlatformState {
    #[serde(default)]
    permission: NotificationPermissionState,
    #[serde(default)]
    subscription: Option<StoredSubscription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSubscription {
    /// Application server key the subscription was created for.
    server_key: String,
    descriptor: PushSubscriptionDescriptor,
    created_at: DateTime<Utc>,
}

/// Push platform backed by a distributor URL and a local state file.
#[derive(Debug)]
pub struct DistributorPlatform {
    /// Distributor base URL; `None` means no push capability.
    distributor_url: Option<String>,
    /// State file path.
    state_file: PathBuf,
    /// Serializes read-modify-write cycles on the state file.
    write_lock: Mutex<()>,
}

impl DistributorPlatform {
    /// Create a platform over `state_file`.
    pub fn new(distributor_url: Option<String>, state_file: impl Into<PathBuf>) -> Self {
        Self {
            distributor_url: distributor_url
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            state_file: state_file.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a platform from the push configuration.
    pub fn from_config(config: &PushConfig) -> Self {
        Self::new(config.distributor_url.clone(), &config.state_file)
    }

    /// Path of the state file.
    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    async fn load(&self) -> AppResult<PlatformState> {
        match fs::read(&self.state_file).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Format,
                    format!("Corrupt push state file: {}", self.state_file.display()),
                    e,
                )
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PlatformState::default()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Internal,
                format!("Failed to read push state: {}", self.state_file.display()),
                e,
            )),
        }
    }

    async fn store(&self, state: &PlatformState) -> AppResult<()> {
        if let Some(parent) = self.state_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Internal,
                    format!("Failed to create state directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = self.state_file.with_extension("tmp");
        fs::write(&tmp, bytes).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Internal,
                format!("Failed to write push state: {}", tmp.display()),
                e,
            )
        })?;
        fs::rename(&tmp, &self.state_file).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Internal,
                format!("Failed to replace push state: {}", self.state_file.display()),
                e,
            )
        })
    }

    fn distributor(&self) -> AppResult<&str> {
        self.distributor_url
            .as_deref()
            .ok_or_else(|| AppError::capability_absent("No push distributor is configured"))
    }
}

#[async_trait]
impl PushPlatform for DistributorPlatform {
    async fn permission(&self) -> AppResult<NotificationPermissionState> {
        if self.distributor_url.is_none() {
            return Ok(NotificationPermissionState::Unsupported);
        }
        Ok(self.load().await?.permission)
    }

    async fn request_permission(
        &self,
        prompt: &dyn PermissionPrompt,
    ) -> AppResult<NotificationPermissionState> {
        if self.distributor_url.is_none() {
            return Ok(NotificationPermissionState::Unsupported);
        }

        let _lock = self.write_lock.lock().await;
        let mut state = self.load().await?;
        if state.permission != NotificationPermissionState::Default {
            return Ok(state.permission);
        }

        let answer = prompt.ask().await?;
        match answer {
            NotificationPermissionState::Granted | NotificationPermissionState::Denied => {
                state.permission = answer;
                self.store(&state).await?;
                info!(permission = %answer, "Notification permission recorded");
                Ok(answer)
            }
            _ => {
                debug!("Permission prompt dismissed");
                Ok(NotificationPermissionState::Default)
            }
        }
    }

    async fn subscribe(&self, server_key: &[u8]) -> AppResult<PushSubscriptionDescriptor> {
        let distributor = self.distributor()?;

        let _lock = self.write_lock.lock().await;
        let mut state = self.load().await?;
        if state.permission != NotificationPermissionState::Granted {
            return Err(AppError::permission_denied(format!(
                "Cannot subscribe while notification permission is {}",
                state.permission
            )));
        }

        let server_key = encode_key(server_key);
        if let Some(existing) = state
            .subscription
            .as_ref()
            .filter(|s| s.server_key == server_key)
        {
            debug!(endpoint = %existing.descriptor.endpoint, "Reusing push subscription");
            return Ok(existing.descriptor.clone());
        }

        let descriptor = PushSubscriptionDescriptor {
            endpoint: format!("{distributor}/push/{}", Uuid::new_v4().simple()),
            keys: PushSubscriptionKeys {
                p256dh: encode_key(&generate_public_key()),
                auth: encode_key(&rand::random::<[u8; AUTH_SECRET_LEN]>()),
            },
        };
        state.subscription = Some(StoredSubscription {
            server_key,
            descriptor: descriptor.clone(),
            created_at: Utc::now(),
        });
        self.store(&state).await?;

        info!(endpoint = %descriptor.endpoint, "Push subscription created");
        Ok(descriptor)
    }

    async fn current_subscription(&self) -> AppResult<Option<PushSubscriptionDescriptor>> {
        if self.distributor_url.is_none() {
            return Ok(None);
        }
        Ok(self.load().await?.subscription.map(|s| s.descriptor))
    }
}

/// Length of the subscription auth secret.
const AUTH_SECRET_LEN: usize = 16;

/// Generate a P-256 key pair and return the uncompressed public point.
fn generate_public_key() -> Vec<u8> {
    SecretKey::random(&mut OsRng)
        .public_key()
        .to_encoded_point(false)
        .as_bytes()
        .to_vec()
}
