//! Request bodies sent to the backend.

use serde::{Deserialize, Serialize};

use orderfeed_core::types::{OrderStatus, ProductId};

/// Body of `POST /cart/add` and `POST /cart/decrease`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuantityRequest {
    /// Product to change.
    pub product_id: ProductId,
    /// Signed quantity delta: `1` to add, `-1` to decrease.
    pub quantity: i32,
}

/// Body of `POST /restaurant-panel/orders/:id/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    /// Requested status.
    pub new_status: OrderStatus,
}

/// Body of `POST /orders/create-from-cart`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Delivery address chosen by the customer.
    pub address_id: String,
    /// Optional note for the restaurant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
