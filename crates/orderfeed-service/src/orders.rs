//! Order list refresh and order status mutations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use orderfeed_api::OrdersApi;
use orderfeed_core::config::ViewScope;
use orderfeed_core::error::AppError;
use orderfeed_core::result::AppResult;
use orderfeed_core::types::{OrderId, OrderRecord, OrderStatus};

use crate::board::OrderBoard;
use crate::busy::BusyKeys;
use crate::refresh::RefreshRoutine;

/// Loads the order list into an [`OrderBoard`] and applies status changes.
#[derive(Debug)]
pub struct OrderController {
    /// Order endpoints.
    api: Arc<dyn OrdersApi>,
    /// Board the view renders from.
    board: Arc<OrderBoard>,
    /// Which list this controller maintains.
    scope: ViewScope,
    /// Orders with a status change in flight.
    busy: BusyKeys<OrderId>,
}

impl OrderController {
    /// Create a controller writing into `board`.
    pub fn new(api: Arc<dyn OrdersApi>, board: Arc<OrderBoard>, scope: ViewScope) -> Self {
        Self {
            api,
            board,
            scope,
            busy: BusyKeys::new(),
        }
    }

    /// The board this controller writes into.
    pub fn board(&self) -> &Arc<OrderBoard> {
        &self.board
    }

    /// List scope.
    pub fn scope(&self) -> ViewScope {
        self.scope
    }

    /// Whether a status change for `order_id` is in flight.
    pub fn is_busy(&self, order_id: OrderId) -> bool {
        self.busy.is_busy(&order_id)
    }

    /// Reload the whole list and replace the board with it.
    ///
    /// Safe to run alongside live-feed prepends; whichever write lands last
    /// is what the board shows.
    pub async fn fetch_orders(&self) -> AppResult<usize> {
        let orders = match self.scope {
            ViewScope::Customer => self.api.my_orders().await?,
            ViewScope::Restaurant => self.api.restaurant_orders().await?,
        };
        let count = orders.len();
        self.board.replace_all(orders).await;
        debug!(count = count, scope = ?self.scope, "Orders fetched");
        Ok(count)
    }

    /// Cancel an order.
    ///
    /// The transition is checked locally first, so a terminal order is
    /// rejected without a backend call. On success only the target record's
    /// status is patched.
    pub async fn cancel(&self, order_id: OrderId) -> AppResult<OrderRecord> {
        let _guard = self.busy.try_acquire(order_id)?;
        let current = self.current(order_id).await?;
        ensure_transition(&current, OrderStatus::Cancelled)?;

        if let Err(e) = self.api.cancel_order(order_id).await {
            warn!(order_id = %order_id, error = %e, "Cancel failed");
            return Err(e);
        }

        let record = match self.board.patch_status(order_id, OrderStatus::Cancelled).await {
            Some(record) => record,
            None => OrderRecord {
                status: OrderStatus::Cancelled,
                ..current
            },
        };
        info!(order_id = %order_id, "Order cancelled");
        Ok(record)
    }

    /// Move an order forward, to `target` or to the next status in sequence.
    ///
    /// Only available to the restaurant side. The record the backend returns
    /// replaces the single board entry.
    pub async fn advance(
        &self,
        order_id: OrderId,
        target: Option<OrderStatus>,
    ) -> AppResult<OrderRecord> {
        if self.scope != ViewScope::Restaurant {
            return Err(AppError::authorization(
                "Only the restaurant can change an order's status",
            ));
        }

        let _guard = self.busy.try_acquire(order_id)?;
        let current = self.current(order_id).await?;
        let target = match target.or_else(|| current.status.next()) {
            Some(target) => target,
            None => {
                return Err(AppError::invalid_transition(format!(
                    "Order {} is {} and cannot change any further",
                    order_id,
                    current.status
                )));
            }
        };
        ensure_transition(&current, target)?;

        let updated = match self.api.update_status(order_id, target).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!(order_id = %order_id, target = %target, error = %e, "Status change failed");
                return Err(e);
            }
        };
        self.board.replace_one(updated.clone()).await;

        info!(order_id = %order_id, from = %current.status, to = %updated.status, "Order status changed");
        Ok(updated)
    }

    /// The board's copy of an order, falling back to the backend.
    async fn current(&self, order_id: OrderId) -> AppResult<OrderRecord> {
        match self.board.get(order_id).await {
            Some(record) => Ok(record),
            None => self.api.order(order_id).await,
        }
    }
}

fn ensure_transition(order: &OrderRecord, to: OrderStatus) -> AppResult<()> {
    if order.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::invalid_transition(format!(
            "Order {} cannot go from {} to {}",
            order.order_id,
            order.status,
            to
        )))
    }
}

#[async_trait]
impl RefreshRoutine for OrderController {
    async fn refresh(&self) -> AppResult<()> {
        self.fetch_orders().await.map(|_| ())
    }
}
