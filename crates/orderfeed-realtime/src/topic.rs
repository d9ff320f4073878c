//! Bus topics the live feed can subscribe to.

use std::fmt;

use orderfeed_core::types::RestaurantId;

/// Typed bus destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedTopic {
    /// New orders placed with one restaurant.
    RestaurantOrders(RestaurantId),
}

impl FeedTopic {
    /// Parses a destination string into a typed topic.
    pub fn parse(destination: &str) -> Option<Self> {
        let rest = destination.strip_prefix("/topic/orders/restaurant/")?;
        rest.parse().ok().map(FeedTopic::RestaurantOrders)
    }

    /// Converts back to a destination string.
    pub fn to_destination(&self) -> String {
        match self {
            FeedTopic::RestaurantOrders(id) => format!("/topic/orders/restaurant/{id}"),
        }
    }
}

impl fmt::Display for FeedTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_destination())
    }
}
