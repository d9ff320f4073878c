//! Client assembly.
//!
//! Wires the REST backend, the push pipeline, and the orders view into one
//! running client. Used by the daemon binary and by `orderfeed-cli watch`.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use orderfeed_api::HttpBackend;
use orderfeed_core::config::AppConfig;
use orderfeed_core::error::{AppError, ErrorKind};
use orderfeed_core::result::AppResult;
use orderfeed_core::types::RestaurantId;
use orderfeed_push::relay::{self, RelayState};
use orderfeed_push::{
    ClientRegistry, DeliveryContext, DeliveryHandle, DistributorPlatform, LogSurface,
    PermissionPrompt, PushPlatform, PushSubscriptionManager, SubscribeOutcome,
};
use orderfeed_service::{OrderBoard, OrderController};

use crate::transport::{BusConnector, WsConnector};
use crate::view::OrdersView;

/// A running client: mounted view plus, when enabled, the push pipeline.
#[derive(Debug)]
pub struct ClientApp {
    view: OrdersView,
    delivery: Option<DeliveryHandle>,
    relay: Option<JoinHandle<AppResult<()>>>,
    push: Option<Arc<PushSubscriptionManager>>,
    shutdown: CancellationToken,
}

impl ClientApp {
    /// Start the client with the WebSocket bus transport.
    pub async fn start(config: &AppConfig, prompt: &dyn PermissionPrompt) -> AppResult<Self> {
        Self::start_with(config, prompt, Arc::new(WsConnector::new())).await
    }

    /// Start the client with a custom bus transport.
    ///
    /// Push and live feed failures are logged and leave the rest running.
    /// Only configuration, relay bind, and REST client setup errors abort.
    pub async fn start_with(
        config: &AppConfig,
        prompt: &dyn PermissionPrompt,
        connector: Arc<dyn BusConnector>,
    ) -> AppResult<Self> {
        config.validate()?;
        info!(scope = ?config.view.scope, api = %config.api.base_url, "Starting orderfeed client");

        let backend = Arc::new(HttpBackend::new(&config.api)?);
        let registry = Arc::new(ClientRegistry::new());
        let shutdown = CancellationToken::new();

        let (delivery, relay, push) = if config.push.enabled {
            let platform: Arc<dyn PushPlatform> =
                Arc::new(DistributorPlatform::from_config(&config.push));
            let delivery =
                DeliveryContext::spawn(Arc::clone(&registry), Arc::new(LogSurface), &config.push);

            let listener = TcpListener::bind(&config.push.relay_bind).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to bind push relay on {}", config.push.relay_bind),
                    e,
                )
            })?;
            let state = RelayState {
                delivery: delivery.clone(),
                platform: Arc::clone(&platform),
            };
            let token = shutdown.clone();
            let relay = tokio::spawn(relay::serve(listener, state, async move {
                token.cancelled().await
            }));

            let manager = Arc::new(PushSubscriptionManager::new(
                platform,
                backend.clone(),
                config.push.vapid_public_key.clone(),
            ));
            match manager.ensure_subscribed(prompt).await {
                Ok(SubscribeOutcome::Subscribed(descriptor)) => {
                    info!(endpoint = %descriptor.endpoint, "Push enabled");
                }
                Ok(outcome) => info!(outcome = ?outcome, "Push not active"),
                Err(e) => warn!(error = %e, "Push subscription failed"),
            }
            (Some(delivery), Some(relay), Some(manager))
        } else {
            info!("Push disabled");
            (None, None, None)
        };

        let controller = Arc::new(OrderController::new(
            backend,
            Arc::new(OrderBoard::new()),
            config.view.scope,
        ));
        let view = OrdersView::new(
            controller,
            registry,
            connector,
            &config.live_feed,
            config.live_feed.restaurant_id.map(RestaurantId),
        );
        if let Err(e) = view.mount().await {
            warn!(error = %e, "Orders view mounted without initial data");
        }

        Ok(Self {
            view,
            delivery,
            relay,
            push,
            shutdown,
        })
    }

    /// The mounted view.
    pub fn view(&self) -> &OrdersView {
        &self.view
    }

    /// Push subscription manager, when push is enabled.
    pub fn push(&self) -> Option<&Arc<PushSubscriptionManager>> {
        self.push.as_ref()
    }

    /// Delivery context inbox, when push is enabled.
    pub fn delivery(&self) -> Option<&DeliveryHandle> {
        self.delivery.as_ref()
    }

    /// Unmount the view, stop the relay, and drain the delivery context.
    pub async fn shutdown(mut self) -> AppResult<()> {
        self.view.unmount();
        self.shutdown.cancel();

        if let Some(relay) = self.relay.take() {
            match relay.await {
                Ok(result) => result?,
                Err(e) => warn!(error = %e, "Push relay task failed"),
            }
        }
        if let Some(delivery) = self.delivery.take() {
            delivery.shutdown().await?;
        }
        info!("orderfeed client stopped");
        Ok(())
    }
}
