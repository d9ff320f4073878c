//! In-memory backend used by the controller tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use orderfeed_api::{CartApi, OrdersApi};
use orderfeed_core::error::AppError;
use orderfeed_core::result::AppResult;
use orderfeed_core::types::{
    Cart, CartLine, OrderId, OrderRecord, OrderStatus, ProductId, RestaurantId,
};

static NEXT_ORDER_ID: AtomicI64 = AtomicI64::new(1000);

pub(crate) fn order(status: OrderStatus) -> OrderRecord {
    OrderRecord {
        order_id: OrderId(NEXT_ORDER_ID.fetch_add(1, Ordering::SeqCst)),
        restaurant_id: Some(RestaurantId(7)),
        restaurant_name: Some("Kebap House".to_string()),
        status,
        items: Vec::new(),
        total_price: 120.0,
        note: None,
        created_at: None,
        updated_at: None,
    }
}

/// Backend double with a failure switch, an artificial latency, and a call log.
#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    pub cart: Mutex<Cart>,
    pub orders: Mutex<Vec<OrderRecord>>,
    pub calls: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    pub latency_ms: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeBackend {
    pub fn with_line(product_id: i64, quantity: u32) -> Self {
        let backend = Self::default();
        backend.set_line(ProductId(product_id), quantity);
        backend
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn set_line(&self, product_id: ProductId, quantity: u32) {
        let mut cart = self.cart.lock().unwrap();
        cart.items.retain(|l| l.product_id != product_id);
        if quantity > 0 {
            cart.items.push(CartLine {
                product_id,
                product_name: None,
                quantity,
                unit_price: 50.0,
                line_total: 50.0 * f64::from(quantity),
            });
        }
        cart.restaurant_id = Some(RestaurantId(7));
        cart.total_item_count = cart.items.iter().map(|l| l.quantity).sum();
        cart.cart_total = cart.items.iter().map(|l| l.line_total).sum();
    }

    async fn enter(&self, call: String) -> AppResult<()> {
        self.calls.lock().unwrap().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst) as u64;
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::network("connection reset by peer"));
        }
        Ok(())
    }
}

#[async_trait]
impl CartApi for FakeBackend {
    async fn get_cart(&self) -> AppResult<Cart> {
        self.enter("get_cart".to_string()).await?;
        Ok(self.cart.lock().unwrap().clone())
    }

    async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> AppResult<Cart> {
        self.enter(format!("add:{product_id}:{quantity}")).await?;
        let current = self.cart.lock().unwrap().quantity_of(product_id);
        self.set_line(product_id, current + quantity);
        Ok(self.cart.lock().unwrap().clone())
    }

    async fn decrease_in_cart(&self, product_id: ProductId) -> AppResult<Cart> {
        self.enter(format!("decrease:{product_id}")).await?;
        let current = self.cart.lock().unwrap().quantity_of(product_id);
        self.set_line(product_id, current.saturating_sub(1));
        Ok(self.cart.lock().unwrap().clone())
    }

    async fn remove_from_cart(&self, product_id: ProductId) -> AppResult<Cart> {
        self.enter(format!("remove:{product_id}")).await?;
        self.set_line(product_id, 0);
        Ok(self.cart.lock().unwrap().clone())
    }

    async fn checkout(&self, address_id: &str, note: Option<&str>) -> AppResult<OrderRecord> {
        self.enter(format!("checkout:{address_id}")).await?;
        let mut record = order(OrderStatus::Pending);
        record.note = note.map(str::to_string);
        record.total_price = self.cart.lock().unwrap().cart_total;
        *self.cart.lock().unwrap() = Cart::default();
        Ok(record)
    }
}

#[async_trait]
impl OrdersApi for FakeBackend {
    async fn my_orders(&self) -> AppResult<Vec<OrderRecord>> {
        self.enter("my_orders".to_string()).await?;
        Ok(self.orders.lock().unwrap().clone())
    }

    async fn restaurant_orders(&self) -> AppResult<Vec<OrderRecord>> {
        self.enter("restaurant_orders".to_string()).await?;
        Ok(self.orders.lock().unwrap().clone())
    }

    async fn order(&self, order_id: OrderId) -> AppResult<OrderRecord> {
        self.enter(format!("order:{order_id}")).await?;
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.order_id == order_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Order not found"))
    }

    async fn cancel_order(&self, order_id: OrderId) -> AppResult<()> {
        self.enter(format!("cancel:{order_id}")).await?;
        self.set_status(order_id, OrderStatus::Cancelled)
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> AppResult<OrderRecord> {
        self.enter(format!("status:{order_id}:{new_status}")).await?;
        self.set_status(order_id, new_status)?;
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.order_id == order_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Order not found"))
    }
}

impl FakeBackend {
    fn set_status(&self, order_id: OrderId, status: OrderStatus) -> AppResult<()> {
        let mut orders = self.orders.lock().unwrap();
        let record = orders
            .iter_mut()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| AppError::not_found("Order not found"))?;
        record.status = status;
        Ok(())
    }
}
