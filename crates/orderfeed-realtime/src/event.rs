//! Events published by the live feed.

use orderfeed_core::types::OrderRecord;

use crate::topic::FeedTopic;

/// Something the live feed observed, broadcast to interested views.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Handshake done and the topic subscribed.
    Connected {
        /// Subscribed topic.
        topic: FeedTopic,
    },
    /// An inbound order, already prepended to the board.
    Order(OrderRecord),
    /// Transport or protocol failure. The feed does not reconnect.
    Error(String),
    /// The connection is closed for good.
    Closed,
}
