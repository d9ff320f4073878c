//! Core type definitions used across the orderfeed workspace.

pub mod cart;
pub mod id;
pub mod order;
pub mod push;
pub mod response;

pub use cart::{Cart, CartLine};
pub use id::*;
pub use order::{OrderItem, OrderRecord, OrderStatus};
pub use push::{
    NotificationPermissionState, PushSubscriptionDescriptor, PushSubscriptionKeys,
    SubscriptionUpsert,
};
pub use response::ApiErrorBody;
