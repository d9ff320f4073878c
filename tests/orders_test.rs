//! Order status transitions against a live HTTP backend.

mod helpers;

use std::sync::Arc;

use orderfeed_api::HttpBackend;
use orderfeed_core::config::ViewScope;
use orderfeed_core::error::ErrorKind;
use orderfeed_core::types::{OrderId, OrderStatus};
use orderfeed_service::{OrderBoard, OrderController};

use helpers::TestBackend;

async fn controller(backend: &TestBackend, scope: ViewScope) -> OrderController {
    let http = Arc::new(HttpBackend::new(&backend.api_config()).expect("client"));
    let controller = OrderController::new(http, Arc::new(OrderBoard::new()), scope);
    controller.fetch_orders().await.expect("fetch orders");
    controller
}

#[tokio::test]
async fn test_cancel_pending_then_reject_further_changes() {
    let backend = TestBackend::start().await;
    backend.add_order(1001, "PENDING");
    let customer = controller(&backend, ViewScope::Customer).await;

    let cancelled = customer.cancel(OrderId(1001)).await.expect("cancel");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(
        customer.board().get(OrderId(1001)).await.map(|o| o.status),
        Some(OrderStatus::Cancelled)
    );

    let again = customer.cancel(OrderId(1001)).await.unwrap_err();
    assert_eq!(again.kind, ErrorKind::InvalidTransition);
    assert_eq!(backend.count("cancel:1001"), 1);

    let restaurant = controller(&backend, ViewScope::Restaurant).await;
    let advance = restaurant.advance(OrderId(1001), None).await.unwrap_err();
    assert_eq!(advance.kind, ErrorKind::InvalidTransition);
    assert!(backend.calls().iter().all(|c| !c.starts_with("status:")));
}

#[tokio::test]
async fn test_restaurant_walks_forward_sequence() {
    let backend = TestBackend::start().await;
    backend.add_order(5, "PENDING");
    let restaurant = controller(&backend, ViewScope::Restaurant).await;

    for expected in [
        OrderStatus::Preparing,
        OrderStatus::Delivering,
        OrderStatus::Completed,
    ] {
        let updated = restaurant.advance(OrderId(5), None).await.expect("advance");
        assert_eq!(updated.status, expected);
    }

    let done = restaurant.advance(OrderId(5), None).await.unwrap_err();
    assert_eq!(done.kind, ErrorKind::InvalidTransition);
    assert_eq!(
        backend.calls().iter().filter(|c| c.starts_with("status:5:")).count(),
        3
    );
}

#[tokio::test]
async fn test_skipping_a_status_is_rejected_locally() {
    let backend = TestBackend::start().await;
    backend.add_order(9, "PENDING");
    let restaurant = controller(&backend, ViewScope::Restaurant).await;

    let err = restaurant
        .advance(OrderId(9), Some(OrderStatus::Completed))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidTransition);
    assert_eq!(backend.count("status:9:COMPLETED"), 0);
}

#[tokio::test]
async fn test_customer_cannot_advance() {
    let backend = TestBackend::start().await;
    backend.add_order(3, "PENDING");
    let customer = controller(&backend, ViewScope::Customer).await;

    let err = customer.advance(OrderId(3), None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}
