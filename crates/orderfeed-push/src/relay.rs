//! Local relay between the push distributor and the delivery context.
//!
//! The distributor POSTs each push it receives for an endpoint minted by
//! [`DistributorPlatform`](crate::platform::DistributorPlatform) to
//! `/push/{token}`. Pushes for anything other than the current subscription
//! are answered with `410 Gone` so the sender drops the stale endpoint.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use orderfeed_core::error::{AppError, ErrorKind};
use orderfeed_core::result::AppResult;
use orderfeed_core::types::NotificationId;

use crate::notifier::{DeliveryHandle, NotificationData};
use crate::platform::PushPlatform;

/// State shared by relay handlers.
#[derive(Debug, Clone)]
pub struct RelayState {
    /// Delivery context inbox.
    pub delivery: DeliveryHandle,
    /// Platform holding the current subscription.
    pub platform: Arc<dyn PushPlatform>,
}

/// Build the relay router.
pub fn build_router(state: RelayState) -> Router {
    Router::new()
        .route("/push/{token}", post(receive_push))
        .route("/notifications/{id}/click", post(notification_click))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the relay on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: RelayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> AppResult<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Push relay listening");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Push relay failed", e))
}

async fn receive_push(
    State(state): State<RelayState>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, String)> {
    let current = state
        .platform
        .current_subscription()
        .await
        .map_err(internal)?;
    let suffix = format!("/push/{token}");
    if !current.is_some_and(|s| s.endpoint.ends_with(&suffix)) {
        debug!(token = %token, "Push for an unknown endpoint");
        return Err((StatusCode::GONE, "Unknown subscription".to_string()));
    }

    let data = (!body.is_empty()).then(|| body.to_vec());
    state.delivery.deliver(data).await.map_err(unavailable)?;
    Ok(StatusCode::CREATED)
}

async fn notification_click(
    State(state): State<RelayState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, String)> {
    let id: NotificationId = id
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid notification id".to_string()))?;
    let data = if body.is_empty() {
        NotificationData::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid notification data: {e}")))?
    };

    state.delivery.click(id, data).await.map_err(unavailable)?;
    Ok(StatusCode::ACCEPTED)
}

async fn health() -> &'static str {
    "ok"
}

fn internal(e: AppError) -> (StatusCode, String) {
    warn!(error = %e, "Relay request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.message)
}

fn unavailable(e: AppError) -> (StatusCode, String) {
    warn!(error = %e, "Delivery context unavailable");
    (StatusCode::SERVICE_UNAVAILABLE, e.message)
}
