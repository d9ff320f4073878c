//! View configuration.

use serde::{Deserialize, Serialize};

/// Which side of the order lifecycle the client shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewScope {
    /// The customer's own orders.
    #[default]
    Customer,
    /// Orders received by the operator's restaurant.
    Restaurant,
}

/// Orders view settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Order list scope.
    #[serde(default)]
    pub scope: ViewScope,
}
