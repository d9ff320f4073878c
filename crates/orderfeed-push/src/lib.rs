//! # orderfeed-push
//!
//! Background delivery for orderfeed. This crate owns:
//!
//! - the compact key codec used for application server and client keys,
//! - the push platform boundary and its file-backed distributor implementation,
//! - the subscription manager driving the notification permission state machine,
//! - the delivery context: an isolated actor that renders notifications and
//!   wakes every registered foreground client,
//! - the local relay endpoint through which the distributor hands pushes in.

pub mod codec;
pub mod manager;
pub mod notifier;
pub mod platform;
pub mod relay;

pub use manager::{PushStatus, PushSubscriptionManager, SubscribeOutcome};
pub use notifier::{
    ClientHandle, ClientMessage, ClientRegistry, DeliveryContext, DeliveryHandle, LogSurface,
    NotificationData, NotificationSurface, PushPayload,
};
pub use platform::{DistributorPlatform, NonInteractivePrompt, PermissionPrompt, PushPlatform};
