//! # orderfeed-core
//!
//! Core crate for orderfeed. Contains configuration schemas, typed
//! identifiers, the order/cart/push domain types, and the unified error
//! system shared by every other crate in the workspace.
//!
//! This crate has **no** internal dependencies on other orderfeed crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
