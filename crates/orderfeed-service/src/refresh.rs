//! The refresh contract shared by initial load and wake signals.

use async_trait::async_trait;

use orderfeed_core::result::AppResult;

/// A full, idempotent reload of a view's state.
///
/// The same routine runs on view mount and whenever a wake signal arrives,
/// so anything that can trigger a refresh only needs this trait.
#[async_trait]
pub trait RefreshRoutine: Send + Sync + 'static {
    /// Reload state from the backend.
    async fn refresh(&self) -> AppResult<()>;
}
