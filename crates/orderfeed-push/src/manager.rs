//! Push subscription lifecycle for one recipient.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, warn};

use orderfeed_api::SubscriptionApi;
use orderfeed_core::error::AppError;
use orderfeed_core::result::AppResult;
use orderfeed_core::types::{
    NotificationPermissionState, PushSubscriptionDescriptor, SubscriptionUpsert,
};

use crate::codec::decode_key;
use crate::platform::{PermissionPrompt, PushPlatform};

/// Result of a subscription attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// The platform has no push capability. Nothing was attempted.
    Unsupported,
    /// The prompt did not end in a grant.
    NotGranted(NotificationPermissionState),
    /// Registered with the platform and persisted on the backend.
    Subscribed(PushSubscriptionDescriptor),
}

/// Snapshot of the push state, without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushStatus {
    /// Platform permission.
    pub permission: NotificationPermissionState,
    /// Current platform subscription.
    pub subscription: Option<PushSubscriptionDescriptor>,
}

/// Drives the permission state machine and keeps the backend's copy of the
/// subscription current.
///
/// The manager never writes the permission state; that belongs to the
/// platform. It reads the state fresh on every call.
#[derive(Debug)]
pub struct PushSubscriptionManager {
    platform: Arc<dyn PushPlatform>,
    api: Arc<dyn SubscriptionApi>,
    /// Application server public key, compact encoding.
    server_key: String,
    terminal_reported: AtomicBool,
}

impl PushSubscriptionManager {
    /// Create a manager for the given application server key.
    pub fn new(
        platform: Arc<dyn PushPlatform>,
        api: Arc<dyn SubscriptionApi>,
        server_key: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            api,
            server_key: server_key.into(),
            terminal_reported: AtomicBool::new(false),
        }
    }

    /// Make sure this device is subscribed and the backend knows about it.
    ///
    /// Safe to call repeatedly: the platform reuses its subscription and the
    /// backend call is an upsert keyed by endpoint.
    pub async fn ensure_subscribed(
        &self,
        prompt: &dyn PermissionPrompt,
    ) -> AppResult<SubscribeOutcome> {
        let state = match self.platform.permission().await? {
            NotificationPermissionState::Unsupported => {
                self.report_terminal("Push notifications are not supported on this platform");
                return Ok(SubscribeOutcome::Unsupported);
            }
            NotificationPermissionState::Denied => {
                let message = "Notifications are blocked. Allow them in the platform settings and try again";
                self.report_terminal(message);
                return Err(AppError::permission_denied(message));
            }
            NotificationPermissionState::Default => {
                let answer = self.platform.request_permission(prompt).await?;
                if answer != NotificationPermissionState::Granted {
                    info!(permission = %answer, "Notification permission not granted");
                    return Ok(SubscribeOutcome::NotGranted(answer));
                }
                answer
            }
            NotificationPermissionState::Granted => NotificationPermissionState::Granted,
        };
        debug!(permission = %state, "Subscribing to push");

        let server_key = decode_key(&self.server_key)?;
        let descriptor = self.platform.subscribe(&server_key).await?;

        if let Err(e) = self
            .api
            .upsert_subscription(&SubscriptionUpsert::from(&descriptor))
            .await
        {
            warn!(endpoint = %descriptor.endpoint, error = %e, "Failed to persist push subscription");
            return Err(e);
        }

        info!(endpoint = %descriptor.endpoint, "Push subscription active");
        Ok(SubscribeOutcome::Subscribed(descriptor))
    }

    /// Current permission and subscription.
    pub async fn status(&self) -> AppResult<PushStatus> {
        Ok(PushStatus {
            permission: self.platform.permission().await?,
            subscription: self.platform.current_subscription().await?,
        })
    }

    fn report_terminal(&self, message: &str) {
        if !self.terminal_reported.swap(true, Ordering::SeqCst) {
            warn!("{message}");
        } else {
            debug!("{message}");
        }
    }
}
