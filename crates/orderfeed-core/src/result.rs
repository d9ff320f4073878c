//! Convenience result type alias for orderfeed.

use crate::error::AppError;

/// A specialized `Result` type for orderfeed operations.
pub type AppResult<T> = Result<T, AppError>;
