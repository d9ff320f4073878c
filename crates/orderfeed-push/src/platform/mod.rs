//! The push platform boundary.
//!
//! A platform owns the notification permission and the device's push
//! subscription. Both can change outside the application, so callers query
//! them on every use rather than caching.

pub mod distributor;

use async_trait::async_trait;

use orderfeed_core::result::AppResult;
use orderfeed_core::types::{NotificationPermissionState, PushSubscriptionDescriptor};

pub use distributor::DistributorPlatform;

/// Platform push service.
#[async_trait]
pub trait PushPlatform: Send + Sync + std::fmt::Debug + 'static {
    /// Current permission. `Unsupported` when the capability is absent.
    async fn permission(&self) -> AppResult<NotificationPermissionState>;

    /// Ask the user for permission through `prompt`.
    ///
    /// Only prompts while the permission is `Default`; any other state is
    /// returned as is. A dismissed prompt leaves the permission at `Default`.
    async fn request_permission(
        &self,
        prompt: &dyn PermissionPrompt,
    ) -> AppResult<NotificationPermissionState>;

    /// Register for pushes signed with `server_key` (raw public key bytes).
    ///
    /// Returns the existing subscription when one is already registered for
    /// the same key.
    async fn subscribe(&self, server_key: &[u8]) -> AppResult<PushSubscriptionDescriptor>;

    /// The current subscription, if any.
    async fn current_subscription(&self) -> AppResult<Option<PushSubscriptionDescriptor>>;
}

/// A user-observable permission prompt, i.e. a direct user gesture.
#[async_trait]
pub trait PermissionPrompt: Send + Sync {
    /// Ask the user. `Default` means the prompt was dismissed.
    async fn ask(&self) -> AppResult<NotificationPermissionState>;
}

/// Prompt for unattended processes: never asks, always dismissed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractivePrompt;

#[async_trait]
impl PermissionPrompt for NonInteractivePrompt {
    async fn ask(&self) -> AppResult<NotificationPermissionState> {
        Ok(NotificationPermissionState::Default)
    }
}
