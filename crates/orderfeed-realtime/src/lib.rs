//! # orderfeed-realtime
//!
//! Foreground real-time plumbing for orderfeed. Provides:
//!
//! - a STOMP 1.2 frame codec and the per-restaurant order topic
//! - the bus transport boundary with WebSocket and in-memory implementations
//! - the live feed subscriber that merges inbound orders into the order board
//! - the foreground bridge that turns wake signals into refreshes
//! - the orders view tying initial load, bridge, and live feed to one lifetime
//! - the client assembly used by the daemon and the CLI

pub mod app;
pub mod bridge;
pub mod connection;
pub mod event;
pub mod frame;
pub mod subscriber;
pub mod topic;
pub mod transport;
pub mod view;

pub use app::ClientApp;
pub use bridge::ForegroundBridge;
pub use connection::{LiveFeedConnection, TransportState};
pub use event::FeedEvent;
pub use frame::{StompCommand, StompFrame};
pub use subscriber::LiveFeedSubscriber;
pub use topic::FeedTopic;
pub use transport::{BusConnector, BusSocket, MemoryBus, MemoryPeer, WsConnector};
pub use view::OrdersView;
