//! Cart mutation controller.
//!
//! Every mutation holds the product's busy lock for the duration of the
//! backend call and, on success, replaces the local cart with the cart the
//! backend returned. Nothing is computed locally; a failed call leaves the
//! previous cart in place.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use orderfeed_api::CartApi;
use orderfeed_core::error::AppError;
use orderfeed_core::result::AppResult;
use orderfeed_core::types::{Cart, OrderRecord, ProductId};

use crate::busy::{BusyGuard, BusyKeys};

/// Cart state for one session plus the operations that change it.
#[derive(Debug)]
pub struct CartController {
    /// Cart endpoints.
    api: Arc<dyn CartApi>,
    /// Last authoritative cart.
    cart: RwLock<Cart>,
    /// Products with a mutation in flight.
    busy: BusyKeys<ProductId>,
    /// Held while a checkout is in flight.
    checkout: Mutex<()>,
}

impl CartController {
    /// Create a controller with an empty cart.
    pub fn new(api: Arc<dyn CartApi>) -> Self {
        Self {
            api,
            cart: RwLock::new(Cart::default()),
            busy: BusyKeys::new(),
            checkout: Mutex::new(()),
        }
    }

    /// Current cart.
    pub async fn cart(&self) -> Cart {
        self.cart.read().await.clone()
    }

    /// Whether a mutation for `product_id` is in flight.
    pub fn is_busy(&self, product_id: ProductId) -> bool {
        self.busy.is_busy(&product_id)
    }

    /// Reload the cart from the backend.
    pub async fn load_cart(&self) -> AppResult<Cart> {
        let cart = self.api.get_cart().await?;
        self.replace(&cart).await;
        Ok(cart)
    }

    /// Add one unit of a product.
    pub async fn increment(&self, product_id: ProductId) -> AppResult<Cart> {
        let guard = self.busy.try_acquire(product_id)?;
        let result = self.api.add_to_cart(product_id, 1).await;
        self.apply(&guard, "increment", result).await
    }

    /// Remove one unit of a product.
    ///
    /// A line at quantity 1 is removed outright rather than decreased to
    /// zero. A product with no line is routed to removal as well, so the
    /// backend decides what an absent line means.
    pub async fn decrement(&self, product_id: ProductId) -> AppResult<Cart> {
        let guard = self.busy.try_acquire(product_id)?;
        let quantity = self.cart.read().await.quantity_of(product_id);

        let result = if quantity <= 1 {
            self.api.remove_from_cart(product_id).await
        } else {
            self.api.decrease_in_cart(product_id).await
        };
        self.apply(&guard, "decrement", result).await
    }

    /// Remove a product's line entirely.
    pub async fn remove(&self, product_id: ProductId) -> AppResult<Cart> {
        let guard = self.busy.try_acquire(product_id)?;
        let result = self.api.remove_from_cart(product_id).await;
        self.apply(&guard, "remove", result).await
    }

    /// Turn the cart into an order. The local cart is cleared on success.
    pub async fn checkout(&self, address_id: &str, note: Option<&str>) -> AppResult<OrderRecord> {
        let _lock = self
            .checkout
            .try_lock()
            .map_err(|_| AppError::busy("Checkout already in progress"))?;

        if address_id.trim().is_empty() {
            return Err(AppError::validation("Delivery address is required"));
        }
        if self.cart.read().await.is_empty() {
            return Err(AppError::validation("Cart is empty"));
        }

        let order = self.api.checkout(address_id, note).await?;
        *self.cart.write().await = Cart::default();

        info!(
            order_id = %order.order_id,
            total = order.total_price,
            "Checkout completed"
        );
        Ok(order)
    }

    async fn apply(
        &self,
        guard: &BusyGuard<ProductId>,
        action: &'static str,
        result: AppResult<Cart>,
    ) -> AppResult<Cart> {
        match result {
            Ok(cart) => {
                self.replace(&cart).await;
                Ok(cart)
            }
            Err(e) => {
                warn!(
                    product_id = %guard.key(),
                    action = action,
                    error = %e,
                    "Cart mutation failed"
                );
                Err(e)
            }
        }
    }

    async fn replace(&self, cart: &Cart) {
        *self.cart.write().await = cart.clone();
    }
}
