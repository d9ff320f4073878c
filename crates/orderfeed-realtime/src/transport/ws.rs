//! WebSocket transport.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

use orderfeed_core::error::{AppError, ErrorKind};
use orderfeed_core::result::AppResult;

use super::{BusConnector, BusSocket};

/// Dials plain WebSocket endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BusConnector for WsConnector {
    async fn connect(&self, url: &str) -> AppResult<Box<dyn BusSocket>> {
        let (stream, response) = connect_async(url).await.map_err(|e| {
            AppError::with_source(ErrorKind::Network, format!("Failed to connect to {url}"), e)
        })?;
        debug!(url = %url, status = %response.status(), "Bus WebSocket connected");
        Ok(Box::new(WsSocket {
            stream,
            closed: false,
        }))
    }
}

struct WsSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

#[async_trait]
impl BusSocket for WsSocket {
    async fn send(&mut self, text: String) -> AppResult<()> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Network, "WebSocket send failed", e))
    }

    async fn recv(&mut self) -> Option<AppResult<String>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => {
                    return Some(Err(AppError::with_source(
                        ErrorKind::Network,
                        "WebSocket receive failed",
                        e,
                    )));
                }
            };
            match message {
                Message::Text(text) => return Some(Ok(text.as_str().to_owned())),
                Message::Binary(data) => {
                    return Some(String::from_utf8(data.to_vec()).map_err(|_| {
                        AppError::malformed_payload("Binary bus message is not UTF-8")
                    }));
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                    trace!("WebSocket control frame");
                }
                Message::Close(frame) => {
                    debug!(frame = ?frame, "WebSocket closed by peer");
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) -> AppResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Network, "WebSocket close failed", e))
    }
}
