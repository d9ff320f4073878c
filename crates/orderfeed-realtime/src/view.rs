//! Orders view lifecycle.
//!
//! Ties the initial load, the foreground bridge, and the live feed to one
//! mount/unmount pair. Everything opened by `mount` is released by
//! `unmount` or by dropping the view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use tracing::{info, warn};

use orderfeed_core::config::{LiveFeedConfig, ViewScope};
use orderfeed_core::result::AppResult;
use orderfeed_core::types::RestaurantId;
use orderfeed_push::ClientRegistry;
use orderfeed_service::{OrderBoard, OrderController, RefreshRoutine};

use crate::bridge::ForegroundBridge;
use crate::connection::TransportState;
use crate::event::FeedEvent;
use crate::subscriber::LiveFeedSubscriber;
use crate::transport::BusConnector;

/// A mountable order list view.
#[derive(Debug)]
pub struct OrdersView {
    controller: Arc<OrderController>,
    registry: Arc<ClientRegistry>,
    connector: Arc<dyn BusConnector>,
    feed_config: LiveFeedConfig,
    /// Restaurant whose topic is followed. Only set for the restaurant scope.
    identity: Option<RestaurantId>,
    bridge: Mutex<Option<ForegroundBridge>>,
    feed: Mutex<Option<LiveFeedSubscriber>>,
    mounted: AtomicBool,
}

impl OrdersView {
    /// Create an unmounted view.
    pub fn new(
        controller: Arc<OrderController>,
        registry: Arc<ClientRegistry>,
        connector: Arc<dyn BusConnector>,
        feed_config: &LiveFeedConfig,
        identity: Option<RestaurantId>,
    ) -> Self {
        let identity = identity.filter(|_| controller.scope() == ViewScope::Restaurant);
        Self {
            controller,
            registry,
            connector,
            feed_config: feed_config.clone(),
            identity,
            bridge: Mutex::new(None),
            feed: Mutex::new(None),
            mounted: AtomicBool::new(false),
        }
    }

    /// Mount the view: start the bridge and the live feed, then load the list.
    ///
    /// Returns the number of orders loaded. A failed initial load is
    /// returned, but the bridge and the feed stay up so a later wake signal
    /// or inbound order can still fill the board. Mounting twice is a no-op.
    pub async fn mount(&self) -> AppResult<usize> {
        if self.mounted.swap(true, Ordering::SeqCst) {
            return Ok(self.board().len().await);
        }

        let refresh: Arc<dyn RefreshRoutine> = self.controller.clone();
        *lock(&self.bridge) = Some(ForegroundBridge::mount(Arc::clone(&self.registry), refresh));

        if let Some(feed) = LiveFeedSubscriber::new(
            self.identity,
            Arc::clone(&self.connector),
            Arc::clone(self.controller.board()),
            &self.feed_config,
        ) {
            feed.activate();
            *lock(&self.feed) = Some(feed);
        }

        match self.controller.fetch_orders().await {
            Ok(count) => {
                info!(count = count, scope = ?self.controller.scope(), "Orders view mounted");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Initial order load failed");
                Err(e)
            }
        }
    }

    /// Unmount the view, releasing the bridge and closing the live feed.
    ///
    /// Returns `false` if the view was not mounted.
    pub fn unmount(&self) -> bool {
        if !self.mounted.swap(false, Ordering::SeqCst) {
            return false;
        }
        if let Some(bridge) = lock(&self.bridge).take() {
            bridge.unmount();
        }
        if let Some(feed) = lock(&self.feed).take() {
            feed.deactivate();
        }
        info!("Orders view unmounted");
        true
    }

    /// Whether the view is mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Board the view renders from.
    pub fn board(&self) -> &Arc<OrderBoard> {
        self.controller.board()
    }

    /// Controller used for refreshes and status changes.
    pub fn controller(&self) -> &Arc<OrderController> {
        &self.controller
    }

    /// Refreshes run in response to wake signals since mounting.
    pub fn wake_refresh_count(&self) -> usize {
        lock(&self.bridge)
            .as_ref()
            .map_or(0, ForegroundBridge::refresh_count)
    }

    /// Live feed events, if a feed is running.
    pub fn feed_events(&self) -> Option<broadcast::Receiver<FeedEvent>> {
        lock(&self.feed).as_ref().map(LiveFeedSubscriber::subscribe_events)
    }

    /// Live feed transport state, if a feed is running.
    pub fn feed_state(&self) -> Option<TransportState> {
        lock(&self.feed).as_ref().map(LiveFeedSubscriber::state)
    }
}

impl Drop for OrdersView {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn lock<T>(slot: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
