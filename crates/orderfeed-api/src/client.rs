//! `reqwest` implementation of the backend API traits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use orderfeed_core::config::ApiConfig;
use orderfeed_core::error::AppError;
use orderfeed_core::result::AppResult;
use orderfeed_core::types::{
    Cart, OrderId, OrderRecord, OrderStatus, ProductId, SubscriptionUpsert,
};

use crate::dto::{CartQuantityRequest, CheckoutRequest, StatusUpdateRequest};
use crate::error::{decode_error, status_error, transport_error};
use crate::traits::{CartApi, OrdersApi, SubscriptionApi};

/// HTTP client for the order backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpBackend {
    /// Build a client from configuration.
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and return the raw body of a successful response.
    async fn send(&self, path: &str, builder: RequestBuilder) -> AppResult<Vec<u8>> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        debug!(path = %path, status = status.as_u16(), bytes = body.len(), "Backend response");

        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(body.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> AppResult<T> {
        let body = self.send(path, builder).await?;
        serde_json::from_slice(&body).map_err(|e| decode_error(path, e))
    }
}

#[async_trait]
impl CartApi for HttpBackend {
    async fn get_cart(&self) -> AppResult<Cart> {
        let path = "/cart";
        self.send_json(path, self.request(Method::GET, path)).await
    }

    async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> AppResult<Cart> {
        let path = "/cart/add";
        let body = CartQuantityRequest {
            product_id,
            quantity: i32::try_from(quantity)
                .map_err(|_| AppError::validation("Quantity out of range"))?,
        };
        self.send_json(path, self.request(Method::POST, path).json(&body))
            .await
    }

    async fn decrease_in_cart(&self, product_id: ProductId) -> AppResult<Cart> {
        let path = "/cart/decrease";
        let body = CartQuantityRequest {
            product_id,
            quantity: -1,
        };
        self.send_json(path, self.request(Method::POST, path).json(&body))
            .await
    }

    async fn remove_from_cart(&self, product_id: ProductId) -> AppResult<Cart> {
        let path = format!("/cart/remove/{product_id}");
        self.send_json(&path, self.request(Method::DELETE, &path))
            .await
    }

    async fn checkout(&self, address_id: &str, note: Option<&str>) -> AppResult<OrderRecord> {
        let path = "/orders/create-from-cart";
        let body = CheckoutRequest {
            address_id: address_id.to_string(),
            note: note.map(str::to_string),
        };
        self.send_json(path, self.request(Method::POST, path).json(&body))
            .await
    }
}

#[async_trait]
impl OrdersApi for HttpBackend {
    async fn my_orders(&self) -> AppResult<Vec<OrderRecord>> {
        let path = "/orders/my-orders";
        self.send_json(path, self.request(Method::GET, path)).await
    }

    async fn restaurant_orders(&self) -> AppResult<Vec<OrderRecord>> {
        let path = "/restaurant-panel/orders";
        self.send_json(path, self.request(Method::GET, path)).await
    }

    async fn order(&self, order_id: OrderId) -> AppResult<OrderRecord> {
        let path = format!("/orders/{order_id}");
        self.send_json(&path, self.request(Method::GET, &path)).await
    }

    async fn cancel_order(&self, order_id: OrderId) -> AppResult<()> {
        let path = format!("/orders/{order_id}/cancel");
        // The response body is not needed: the caller patches the status locally.
        self.send(&path, self.request(Method::POST, &path)).await?;
        Ok(())
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> AppResult<OrderRecord> {
        let path = format!("/restaurant-panel/orders/{order_id}/status");
        let body = StatusUpdateRequest { new_status };
        self.send_json(&path, self.request(Method::POST, &path).json(&body))
            .await
    }
}

#[async_trait]
impl SubscriptionApi for HttpBackend {
    async fn upsert_subscription(&self, subscription: &SubscriptionUpsert) -> AppResult<()> {
        let path = "/customer/subscribe";
        self.send(path, self.request(Method::POST, path).json(subscription))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use orderfeed_core::error::ErrorKind;
    use serde_json::{Value, json};

    #[derive(Clone, Default)]
    struct Recorded {
        bodies: Arc<Mutex<Vec<(String, Value)>>>,
        auth: Arc<Mutex<Option<String>>>,
    }

    fn cart_json(quantity: u32) -> Value {
        json!({
            "restaurantId": 7,
            "items": [{"productId": 42, "quantity": quantity, "unitPrice": 50.0, "lineTotalPrice": 50.0 * quantity as f64}],
            "totalItemCount": quantity,
            "cartTotal": 50.0 * quantity as f64
        })
    }

    fn order_json(id: i64, status: &str) -> Value {
        json!({"orderId": id, "restaurantId": 7, "orderStatus": status, "items": [], "totalPrice": 99.5})
    }

    const ORDER_ID: i64 = 1001;

    async fn spawn_backend() -> (HttpBackend, Recorded) {
        let recorded = Recorded::default();
        let app = Router::new()
            .route(
                "/api/cart/add",
                post(
                    |State(r): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        *r.auth.lock().unwrap() = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        r.bodies.lock().unwrap().push(("add".to_string(), body));
                        Json(cart_json(2))
                    },
                ),
            )
            .route(
                "/api/cart/decrease",
                post(|State(r): State<Recorded>, Json(body): Json<Value>| async move {
                    r.bodies.lock().unwrap().push(("decrease".to_string(), body));
                    Json(cart_json(1))
                }),
            )
            .route(
                "/api/cart/remove/{id}",
                delete(|Path(id): Path<i64>| async move {
                    assert_eq!(id, 42);
                    Json(json!({"items": [], "totalItemCount": 0, "cartTotal": 0.0}))
                }),
            )
            .route(
                "/api/orders/my-orders",
                get(|| async { Json(json!([order_json(ORDER_ID, "PENDING")])) }),
            )
            .route(
                "/api/orders/{id}/cancel",
                post(|Path(id): Path<i64>| async move {
                    if id == ORDER_ID {
                        (StatusCode::OK, Json(order_json(ORDER_ID, "CANCELLED")))
                    } else {
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({"message": "Order can no longer be cancelled"})),
                        )
                    }
                }),
            )
            .route(
                "/api/restaurant-panel/orders/{id}/status",
                post(|State(r): State<Recorded>, Json(body): Json<Value>| async move {
                    r.bodies.lock().unwrap().push(("status".to_string(), body));
                    Json(order_json(ORDER_ID, "PREPARING"))
                }),
            )
            .route(
                "/api/customer/subscribe",
                post(|State(r): State<Recorded>, Json(body): Json<Value>| async move {
                    r.bodies.lock().unwrap().push(("subscribe".to_string(), body));
                    StatusCode::OK
                }),
            )
            .route("/api/cart", get(|| async { "not json" }))
            .with_state(recorded.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        let backend = HttpBackend::new(&ApiConfig {
            base_url: format!("http://{addr}/api/"),
            auth_token: Some("secret-token".to_string()),
            timeout_seconds: 5,
        })
        .expect("client");
        (backend, recorded)
    }

    #[tokio::test]
    async fn test_add_to_cart_sends_quantity_and_token() {
        let (backend, recorded) = spawn_backend().await;

        let cart = backend.add_to_cart(ProductId(42), 1).await.expect("add");

        assert_eq!(cart.quantity_of(ProductId(42)), 2);
        let bodies = recorded.bodies.lock().unwrap().clone();
        assert_eq!(bodies[0].1, json!({"productId": 42, "quantity": 1}));
        assert_eq!(
            recorded.auth.lock().unwrap().as_deref(),
            Some("Bearer secret-token")
        );
    }

    #[tokio::test]
    async fn test_decrease_sends_negative_quantity() {
        let (backend, recorded) = spawn_backend().await;

        let cart = backend.decrease_in_cart(ProductId(42)).await.expect("decrease");

        assert_eq!(cart.quantity_of(ProductId(42)), 1);
        let bodies = recorded.bodies.lock().unwrap().clone();
        assert_eq!(bodies[0].1, json!({"productId": 42, "quantity": -1}));
    }

    #[tokio::test]
    async fn test_remove_returns_authoritative_cart() {
        let (backend, _) = spawn_backend().await;
        let cart = backend.remove_from_cart(ProductId(42)).await.expect("remove");
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_my_orders() {
        let (backend, _) = spawn_backend().await;
        let orders = backend.my_orders().await.expect("orders");
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_cancel_error_message_is_surfaced() {
        let (backend, _) = spawn_backend().await;

        backend
            .cancel_order(OrderId(ORDER_ID))
            .await
            .expect("cancel");

        let err = backend
            .cancel_order(OrderId(1002))
            .await
            .expect_err("should be rejected");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "Order can no longer be cancelled");
    }

    #[tokio::test]
    async fn test_update_status_body() {
        let (backend, recorded) = spawn_backend().await;

        let order = backend
            .update_status(OrderId(ORDER_ID), OrderStatus::Preparing)
            .await
            .expect("status");

        assert_eq!(order.status, OrderStatus::Preparing);
        let bodies = recorded.bodies.lock().unwrap().clone();
        assert_eq!(bodies[0].1, json!({"newStatus": "PREPARING"}));
    }

    #[tokio::test]
    async fn test_upsert_subscription_body() {
        let (backend, recorded) = spawn_backend().await;

        backend
            .upsert_subscription(&SubscriptionUpsert {
                endpoint: "https://push.example/abc".to_string(),
                p256dh: "BPk".to_string(),
                auth: "c2VjcmV0".to_string(),
            })
            .await
            .expect("upsert");

        let bodies = recorded.bodies.lock().unwrap().clone();
        assert_eq!(
            bodies[0].1,
            json!({"endpoint": "https://push.example/abc", "p256dh": "BPk", "auth": "c2VjcmV0"})
        );
    }

    #[tokio::test]
    async fn test_unexpected_body_is_malformed_payload() {
        let (backend, _) = spawn_backend().await;
        let err = backend.get_cart().await.expect_err("not json");
        assert_eq!(err.kind, ErrorKind::MalformedPayload);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let backend = HttpBackend::new(&ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            auth_token: None,
            timeout_seconds: 2,
        })
        .expect("client");

        let err = backend.my_orders().await.expect_err("unreachable");
        assert_eq!(err.kind, ErrorKind::Network);
    }
}
