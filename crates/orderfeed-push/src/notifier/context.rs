//! The delivery-context actor.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use orderfeed_core::config::PushConfig;
use orderfeed_core::error::AppError;
use orderfeed_core::result::AppResult;
use orderfeed_core::types::NotificationId;

use super::registry::ClientRegistry;
use super::surface::{NotificationOptions, NotificationSurface};
use super::{ClientMessage, NotificationData, PushPayload};

const EVENT_BUFFER: usize = 64;

#[derive(Debug)]
enum DeliveryEvent {
    Push {
        data: Option<Vec<u8>>,
        ack: oneshot::Sender<()>,
    },
    Click {
        notification_id: NotificationId,
        data: NotificationData,
        ack: oneshot::Sender<()>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Sending side of the delivery context. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DeliveryHandle {
    tx: mpsc::Sender<DeliveryEvent>,
}

impl DeliveryHandle {
    /// Hand an inbound push to the context.
    ///
    /// Returns as soon as the push is acknowledged, before the notification
    /// is rendered or any client is woken.
    pub async fn deliver(&self, data: Option<Vec<u8>>) -> AppResult<()> {
        let (ack, acked) = oneshot::channel();
        self.send(DeliveryEvent::Push { data, ack }).await?;
        acked.await.map_err(|_| not_running())
    }

    /// Report a click on a rendered notification.
    pub async fn click(&self, notification_id: NotificationId, data: NotificationData) -> AppResult<()> {
        let (ack, acked) = oneshot::channel();
        self.send(DeliveryEvent::Click {
            notification_id,
            data,
            ack,
        })
        .await?;
        acked.await.map_err(|_| not_running())
    }

    /// Stop the context once every kept-alive event has finished.
    pub async fn shutdown(&self) -> AppResult<()> {
        let (done, finished) = oneshot::channel();
        self.send(DeliveryEvent::Shutdown { done }).await?;
        finished.await.map_err(|_| not_running())
    }

    /// Whether the context is still accepting events.
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    async fn send(&self, event: DeliveryEvent) -> AppResult<()> {
        self.tx.send(event).await.map_err(|_| not_running())
    }
}

fn not_running() -> AppError {
    AppError::internal("Delivery context is not running")
}

/// Isolated actor that turns pushes into notifications and wake signals.
///
/// Every event is kept alive in a task set until its work completes; the
/// actor does not exit while any of them is outstanding.
pub struct DeliveryContext {
    registry: Arc<ClientRegistry>,
    surface: Arc<dyn NotificationSurface>,
    icon: String,
    app_origin: String,
    rx: mpsc::Receiver<DeliveryEvent>,
    keep_alive: JoinSet<()>,
}

impl DeliveryContext {
    /// Start the context on the current runtime.
    pub fn spawn(
        registry: Arc<ClientRegistry>,
        surface: Arc<dyn NotificationSurface>,
        config: &PushConfig,
    ) -> DeliveryHandle {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        registry.set_context_active(true);

        let context = Self {
            registry,
            surface,
            icon: config.icon.clone(),
            app_origin: config.app_origin.clone(),
            rx,
            keep_alive: JoinSet::new(),
        };
        tokio::spawn(context.run());
        info!("Delivery context started");

        DeliveryHandle { tx }
    }

    async fn run(mut self) {
        let mut shutdown = None;

        loop {
            tokio::select! {
                event = self.rx.recv() => match event {
                    Some(DeliveryEvent::Push { data, ack }) => self.on_push(data, ack),
                    Some(DeliveryEvent::Click { notification_id, data, ack }) => {
                        self.on_click(notification_id, data, ack)
                    }
                    Some(DeliveryEvent::Shutdown { done }) => {
                        shutdown = Some(done);
                        break;
                    }
                    None => break,
                },
                Some(joined) = self.keep_alive.join_next(), if !self.keep_alive.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Delivery task failed");
                    }
                }
            }
        }

        self.rx.close();
        let pending = self.keep_alive.len();
        if pending > 0 {
            debug!(pending = pending, "Draining kept-alive events");
        }
        while let Some(joined) = self.keep_alive.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Delivery task failed");
            }
        }

        self.registry.set_context_active(false);
        info!("Delivery context stopped");
        if let Some(done) = shutdown {
            let _ = done.send(());
        }
    }

    fn on_push(&mut self, data: Option<Vec<u8>>, ack: oneshot::Sender<()>) {
        let PushPayload { title, body } = PushPayload::parse(data.as_deref());
        let _ = ack.send(());

        let options = NotificationOptions {
            body,
            icon: self.icon.clone(),
            badge: self.icon.clone(),
            data: NotificationData::default(),
        };
        let surface = Arc::clone(&self.surface);
        let registry = Arc::clone(&self.registry);

        self.keep_alive.spawn(async move {
            let (shown, woken) = tokio::join!(surface.show(&title, &options), async {
                registry.post_all(&ClientMessage::PushUpdate)
            });
            match shown {
                Ok(id) => debug!(notification_id = %id, clients = woken, "Push handled"),
                Err(e) => warn!(error = %e, clients = woken, "Notification could not be shown"),
            }
        });
    }

    fn on_click(&mut self, notification_id: NotificationId, data: NotificationData, ack: oneshot::Sender<()>) {
        let url = resolve_url(&self.app_origin, &data.url);
        let surface = Arc::clone(&self.surface);
        let _ = ack.send(());

        self.keep_alive.spawn(async move {
            if let Err(e) = surface.close(notification_id).await {
                warn!(notification_id = %notification_id, error = %e, "Close failed");
            }
            if let Err(e) = surface.open_url(&url).await {
                warn!(url = %url, error = %e, "Open failed");
            }
        });
    }
}

/// Resolve a click target against the application origin.
fn resolve_url(origin: &str, target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        return target.to_string();
    }
    let origin = origin.trim_end_matches('/');
    let path = target.trim();
    if path.is_empty() {
        format!("{origin}/")
    } else if path.starts_with('/') {
        format!("{origin}{path}")
    } else {
        format!("{origin}/{path}")
    }
}
