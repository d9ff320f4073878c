//! Order records and the order status lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId, RestaurantId};

/// Status of an order.
///
/// Forward progress follows `Pending → Preparing → Delivering → Completed`.
/// `Cancelled` is reachable only from `Pending` or `Preparing`.
/// `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed, not yet accepted by the restaurant.
    Pending,
    /// Being prepared.
    Preparing,
    /// On the way.
    Delivering,
    /// Delivered.
    Completed,
    /// Cancelled by the customer or the restaurant.
    Cancelled,
}

impl OrderStatus {
    /// Whether no further transition is permitted.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the order may still be cancelled.
    pub fn can_cancel(self) -> bool {
        matches!(self, Self::Pending | Self::Preparing)
    }

    /// The next status in the forward sequence, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Preparing),
            Self::Preparing => Some(Self::Delivering),
            Self::Delivering => Some(Self::Completed),
            Self::Completed | Self::Cancelled => None,
        }
    }

    /// Whether `self → to` is a permitted transition.
    pub fn can_transition_to(self, to: Self) -> bool {
        if to == Self::Cancelled {
            return self.can_cancel();
        }
        self.next() == Some(to)
    }

    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Preparing => "PREPARING",
            Self::Delivering => "DELIVERING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PREPARING" => Ok(Self::Preparing),
            "DELIVERING" => Ok(Self::Delivering),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// One line of an order.
///
/// Order responses identify lines by product name; the product id and the
/// line total are only present on some endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product ordered.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Product display name.
    #[serde(default)]
    pub product_name: Option<String>,
    /// Quantity ordered.
    pub quantity: u32,
    /// Unit price at checkout.
    #[serde(alias = "price")]
    pub unit_price: f64,
    /// Server-computed line total.
    #[serde(default, alias = "lineTotal")]
    pub line_total_price: Option<f64>,
}

impl OrderItem {
    /// Line total, computed from quantity and unit price when the backend omits it.
    pub fn line_total(&self) -> f64 {
        self.line_total_price
            .unwrap_or(self.unit_price * f64::from(self.quantity))
    }
}

/// An order as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Order identifier.
    pub order_id: OrderId,
    /// Restaurant the order was placed with. Customer order lists omit it.
    #[serde(default)]
    pub restaurant_id: Option<RestaurantId>,
    /// Restaurant display name.
    #[serde(default)]
    pub restaurant_name: Option<String>,
    /// Current status.
    #[serde(rename = "orderStatus", alias = "status")]
    pub status: OrderStatus,
    /// Ordered lines.
    #[serde(default, alias = "orderItems")]
    pub items: Vec<OrderItem>,
    /// Server-computed total.
    pub total_price: f64,
    /// Free-text note left by the customer.
    #[serde(default)]
    pub note: Option<String>,
    /// When the order was placed.
    #[serde(default, alias = "orderTime")]
    pub created_at: Option<NaiveDateTime>,
    /// When the order last changed.
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}
