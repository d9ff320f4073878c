//! # orderfeed-service
//!
//! Client-side state and the mutation discipline applied to it. The
//! [`OrderBoard`] is the single order-list container shared by the refresh
//! path and the live feed; the controllers serialize mutations per item key
//! and replace local state only from authoritative backend responses.
//!
//! Controllers follow constructor injection: backend APIs and shared state
//! are handed in as `Arc`s.

pub mod board;
pub mod busy;
pub mod cart;
pub mod orders;
pub mod refresh;

#[cfg(test)]
pub(crate) mod testing;

pub use board::OrderBoard;
pub use busy::{BusyGuard, BusyKeys};
pub use cart::CartController;
pub use orders::OrderController;
pub use refresh::RefreshRoutine;
