//! Where notifications are shown and where clicks lead.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use orderfeed_core::result::AppResult;
use orderfeed_core::types::NotificationId;

use super::NotificationData;

/// Options a notification is rendered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    /// Body text.
    pub body: String,
    /// Icon path.
    pub icon: String,
    /// Badge path.
    pub badge: String,
    /// Data carried to the click handler.
    pub data: NotificationData,
}

/// Platform notification display.
#[async_trait]
pub trait NotificationSurface: Send + Sync + std::fmt::Debug + 'static {
    /// Render a notification.
    async fn show(&self, title: &str, options: &NotificationOptions) -> AppResult<NotificationId>;

    /// Close a rendered notification.
    async fn close(&self, id: NotificationId) -> AppResult<()>;

    /// Focus or open the given absolute URL.
    async fn open_url(&self, url: &str) -> AppResult<()>;
}

/// Surface that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSurface;

#[async_trait]
impl NotificationSurface for LogSurface {
    async fn show(&self, title: &str, options: &NotificationOptions) -> AppResult<NotificationId> {
        let id = NotificationId::new();
        info!(
            notification_id = %id,
            title = %title,
            body = %options.body,
            url = %options.data.url,
            "Notification"
        );
        Ok(id)
    }

    async fn close(&self, id: NotificationId) -> AppResult<()> {
        info!(notification_id = %id, "Notification closed");
        Ok(())
    }

    async fn open_url(&self, url: &str) -> AppResult<()> {
        info!(url = %url, "Open");
        Ok(())
    }
}
