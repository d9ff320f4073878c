//! Cart snapshot as returned by the backend.
//!
//! The cart is never derived locally: every mutation response is a full
//! authoritative snapshot that replaces whatever the client held before.

use serde::{Deserialize, Serialize};

use super::id::{ProductId, RestaurantId};

/// One product line in the cart. `quantity` is always at least 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product in the line.
    pub product_id: ProductId,
    /// Product display name.
    #[serde(default)]
    pub product_name: Option<String>,
    /// Quantity, never below 1.
    pub quantity: u32,
    /// Unit price.
    pub unit_price: f64,
    /// Server-computed line total.
    #[serde(rename = "lineTotalPrice", alias = "lineTotal")]
    pub line_total: f64,
}

/// The session's cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Restaurant every line belongs to.
    #[serde(default)]
    pub restaurant_id: Option<RestaurantId>,
    /// Restaurant display name.
    #[serde(default)]
    pub restaurant_name: Option<String>,
    /// Product lines.
    #[serde(default)]
    pub items: Vec<CartLine>,
    /// Server-computed item count.
    #[serde(default)]
    pub total_item_count: u32,
    /// Server-computed grand total.
    #[serde(default)]
    pub cart_total: f64,
}

impl Cart {
    /// Look up the line for a product.
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.items.iter().find(|line| line.product_id == product_id)
    }

    /// Current quantity of a product, zero when absent.
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.line(product_id).map(|line| line.quantity).unwrap_or(0)
    }

    /// Whether the cart holds no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
