//! Message bus transport boundary.
//!
//! The live feed speaks STOMP text frames over a [`BusSocket`] obtained from
//! a [`BusConnector`]. Production uses [`WsConnector`]; tests and embedded
//! setups use [`MemoryBus`].

pub mod memory;
pub mod ws;

use async_trait::async_trait;

use orderfeed_core::result::AppResult;

pub use self::memory::{MemoryBus, MemoryPeer};
pub use self::ws::WsConnector;

/// Opens bus connections.
#[async_trait]
pub trait BusConnector: Send + Sync + std::fmt::Debug + 'static {
    /// Dial `url` and return an open socket.
    async fn connect(&self, url: &str) -> AppResult<Box<dyn BusSocket>>;
}

/// One open, text-framed bus connection.
#[async_trait]
pub trait BusSocket: Send {
    /// Send one text message.
    async fn send(&mut self, text: String) -> AppResult<()>;

    /// Next text message. `None` once the peer has closed.
    async fn recv(&mut self) -> Option<AppResult<String>>;

    /// Close the connection. Closing twice is harmless.
    async fn close(&mut self) -> AppResult<()>;
}
