//! Shared helpers for integration tests: an in-process order backend.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use orderfeed_core::config::{ApiConfig, AppConfig};

/// Mutable backend state, inspected by tests.
#[derive(Debug, Default)]
pub struct BackendState {
    /// Product id → quantity.
    pub cart: BTreeMap<i64, u32>,
    /// Orders as JSON, newest first.
    pub orders: Vec<Value>,
    /// Make cart mutations answer 503.
    pub fail_cart: bool,
    /// Log of handled calls, e.g. `"add:42"` or `"my_orders"`.
    pub calls: Vec<String>,
    /// Bodies received on `/customer/subscribe`.
    pub subscriptions: Vec<Value>,
}

type Shared = Arc<Mutex<BackendState>>;

/// Order backend served on a loopback port.
pub struct TestBackend {
    /// Base URL including the `/api` prefix.
    pub base_url: String,
    /// Backend state.
    pub state: Shared,
    server: JoinHandle<()>,
}

impl TestBackend {
    /// Start a backend with an empty cart and no orders.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::default()));
        let api = Router::new()
            .route("/cart", get(get_cart))
            .route("/cart/add", post(add_to_cart))
            .route("/cart/decrease", post(decrease_in_cart))
            .route("/cart/remove/{id}", delete(remove_from_cart))
            .route("/orders/create-from-cart", post(create_from_cart))
            .route("/orders/my-orders", get(my_orders))
            .route("/orders/{id}", get(get_order))
            .route("/orders/{id}/cancel", post(cancel_order))
            .route("/restaurant-panel/orders", get(restaurant_orders))
            .route("/restaurant-panel/orders/{id}/status", post(update_status))
            .route("/customer/subscribe", post(subscribe))
            .with_state(state.clone());
        let app = Router::new().nest("/api", api);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind backend");
        let addr = listener.local_addr().expect("backend addr");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("backend server");
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
            server,
        }
    }

    /// REST settings pointing at this backend.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            auth_token: Some("test-token".to_string()),
            timeout_seconds: 5,
        }
    }

    /// Client settings pointing at this backend, push disabled.
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            api: self.api_config(),
            ..AppConfig::default()
        }
    }

    /// Add an order at the top of the list.
    pub fn add_order(&self, id: i64, status: &str) {
        self.state.lock().unwrap().orders.insert(0, order_json(id, status));
    }

    /// Put a product line in the cart.
    pub fn set_line(&self, product_id: i64, quantity: u32) {
        self.state.lock().unwrap().cart.insert(product_id, quantity);
    }

    /// Copy of the call log.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// How many times `call` was handled.
    pub fn count(&self, call: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| *c == call).count()
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Order JSON in the backend's wire shape.
pub fn order_json(id: i64, status: &str) -> Value {
    json!({
        "orderId": id,
        "restaurantId": 7,
        "restaurantName": "Kebap House",
        "orderStatus": status,
        "items": [],
        "totalPrice": 120.0
    })
}

/// Poll `check` until it holds, failing the test after five seconds.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check().await {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn record(state: &Shared, call: String) {
    state.lock().unwrap().calls.push(call);
}

fn cart_json(state: &BackendState) -> Value {
    let items: Vec<Value> = state
        .cart
        .iter()
        .map(|(id, qty)| {
            json!({
                "productId": id,
                "quantity": qty,
                "unitPrice": 50.0,
                "lineTotalPrice": 50.0 * f64::from(*qty)
            })
        })
        .collect();
    let count: u32 = state.cart.values().sum();
    json!({
        "restaurantId": 7,
        "items": items,
        "totalItemCount": count,
        "cartTotal": 50.0 * f64::from(count)
    })
}

fn unavailable() -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"message": "Cart service unavailable"})),
    )
}

async fn get_cart(State(state): State<Shared>) -> Json<Value> {
    record(&state, "get_cart".to_string());
    Json(cart_json(&state.lock().unwrap()))
}

async fn add_to_cart(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let id = body["productId"].as_i64().unwrap_or_default();
    let qty = body["quantity"].as_u64().unwrap_or_default() as u32;
    record(&state, format!("add:{id}"));
    let mut guard = state.lock().unwrap();
    if guard.fail_cart {
        return Err(unavailable());
    }
    *guard.cart.entry(id).or_default() += qty;
    Ok(Json(cart_json(&guard)))
}

async fn decrease_in_cart(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let id = body["productId"].as_i64().unwrap_or_default();
    record(&state, format!("decrease:{id}"));
    let mut guard = state.lock().unwrap();
    if guard.fail_cart {
        return Err(unavailable());
    }
    if let Some(qty) = guard.cart.get_mut(&id) {
        *qty = qty.saturating_sub(1);
    }
    guard.cart.retain(|_, qty| *qty > 0);
    Ok(Json(cart_json(&guard)))
}

async fn remove_from_cart(
    State(state): State<Shared>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    record(&state, format!("remove:{id}"));
    let mut guard = state.lock().unwrap();
    if guard.fail_cart {
        return Err(unavailable());
    }
    guard.cart.remove(&id);
    Ok(Json(cart_json(&guard)))
}

async fn create_from_cart(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    record(&state, format!("checkout:{}", body["addressId"].as_str().unwrap_or_default()));
    let mut guard = state.lock().unwrap();
    if guard.cart.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(json!({"message": "Cart is empty"}))));
    }
    let id = 2000 + guard.orders.len() as i64;
    let mut order = order_json(id, "PENDING");
    order["totalPrice"] = cart_json(&guard)["cartTotal"].clone();
    order["note"] = body["note"].clone();
    guard.cart.clear();
    guard.orders.insert(0, order.clone());
    Ok(Json(order))
}

async fn my_orders(State(state): State<Shared>) -> Json<Value> {
    record(&state, "my_orders".to_string());
    Json(Value::Array(state.lock().unwrap().orders.clone()))
}

async fn restaurant_orders(State(state): State<Shared>) -> Json<Value> {
    record(&state, "restaurant_orders".to_string());
    Json(Value::Array(state.lock().unwrap().orders.clone()))
}

async fn get_order(
    State(state): State<Shared>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    record(&state, format!("order:{id}"));
    state
        .lock()
        .unwrap()
        .orders
        .iter()
        .find(|o| o["orderId"].as_i64() == Some(id))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn cancel_order(
    State(state): State<Shared>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    record(&state, format!("cancel:{id}"));
    let mut guard = state.lock().unwrap();
    let order = guard
        .orders
        .iter_mut()
        .find(|o| o["orderId"].as_i64() == Some(id))
        .ok_or((StatusCode::NOT_FOUND, Json(json!({"message": "Order not found"}))))?;
    match order["orderStatus"].as_str() {
        Some("PENDING") | Some("PREPARING") => {
            order["orderStatus"] = json!("CANCELLED");
            Ok(Json(order.clone()))
        }
        _ => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Order can no longer be cancelled"})),
        )),
    }
}

async fn update_status(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let status = body["newStatus"].as_str().unwrap_or_default().to_string();
    record(&state, format!("status:{id}:{status}"));
    let mut guard = state.lock().unwrap();
    let order = guard
        .orders
        .iter_mut()
        .find(|o| o["orderId"].as_i64() == Some(id))
        .ok_or(StatusCode::NOT_FOUND)?;
    order["orderStatus"] = json!(status);
    Ok(Json(order.clone()))
}

async fn subscribe(State(state): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    record(&state, "subscribe".to_string());
    state.lock().unwrap().subscriptions.push(body);
    StatusCode::OK
}
