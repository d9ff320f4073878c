//! # orderfeed-api
//!
//! Client side of the backend REST boundary. The traits in [`traits`] are
//! the seams the service layer and the push manager depend on;
//! [`client::HttpBackend`] implements all of them over `reqwest`.

pub mod client;
pub mod dto;
pub mod error;
pub mod traits;

pub use client::HttpBackend;
pub use traits::{CartApi, OrdersApi, SubscriptionApi};
