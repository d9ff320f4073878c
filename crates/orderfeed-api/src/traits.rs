//! Backend API traits.
//!
//! Each trait covers one area of the REST boundary so that callers (and
//! their test doubles) only depend on the endpoints they actually use.

use async_trait::async_trait;

use orderfeed_core::result::AppResult;
use orderfeed_core::types::{
    Cart, OrderId, OrderRecord, OrderStatus, ProductId, SubscriptionUpsert,
};

/// Cart endpoints. Every mutating call returns the full authoritative cart.
#[async_trait]
pub trait CartApi: Send + Sync + std::fmt::Debug + 'static {
    /// `GET /cart`
    async fn get_cart(&self) -> AppResult<Cart>;

    /// `POST /cart/add {productId, quantity}`
    async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> AppResult<Cart>;

    /// `POST /cart/decrease {productId, quantity: -1}`
    async fn decrease_in_cart(&self, product_id: ProductId) -> AppResult<Cart>;

    /// `DELETE /cart/remove/:productId`
    async fn remove_from_cart(&self, product_id: ProductId) -> AppResult<Cart>;

    /// `POST /orders/create-from-cart {addressId, note}`
    async fn checkout(&self, address_id: &str, note: Option<&str>) -> AppResult<OrderRecord>;
}

/// Order endpoints.
#[async_trait]
pub trait OrdersApi: Send + Sync + std::fmt::Debug + 'static {
    /// `GET /orders/my-orders`
    async fn my_orders(&self) -> AppResult<Vec<OrderRecord>>;

    /// `GET /restaurant-panel/orders`
    async fn restaurant_orders(&self) -> AppResult<Vec<OrderRecord>>;

    /// `GET /orders/:orderId`
    async fn order(&self, order_id: OrderId) -> AppResult<OrderRecord>;

    /// `POST /orders/:orderId/cancel`
    async fn cancel_order(&self, order_id: OrderId) -> AppResult<()>;

    /// `POST /restaurant-panel/orders/:orderId/status {newStatus}`
    async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> AppResult<OrderRecord>;
}

/// Push subscription persistence.
#[async_trait]
pub trait SubscriptionApi: Send + Sync + std::fmt::Debug + 'static {
    /// `POST /customer/subscribe {endpoint, p256dh, auth}`, an upsert keyed by endpoint.
    async fn upsert_subscription(&self, subscription: &SubscriptionUpsert) -> AppResult<()>;
}
