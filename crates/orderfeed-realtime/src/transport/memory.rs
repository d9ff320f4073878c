//! In-memory bus for tests and single-process setups.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use orderfeed_core::error::AppError;
use orderfeed_core::result::AppResult;

use super::{BusConnector, BusSocket};
use crate::frame::StompFrame;

/// In-memory connector. Each `connect` hands the server side of the new
/// connection to whoever calls [`MemoryBus::accept`].
#[derive(Debug, Clone)]
pub struct MemoryBus {
    inner: Arc<MemoryBusInner>,
}

#[derive(Debug)]
struct MemoryBusInner {
    incoming: mpsc::UnboundedSender<MemoryPeer>,
    accept: Mutex<mpsc::UnboundedReceiver<MemoryPeer>>,
    connects: AtomicUsize,
    refuse: AtomicBool,
}

impl MemoryBus {
    /// Create a bus with no connections.
    pub fn new() -> Self {
        let (incoming, accept) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(MemoryBusInner {
                incoming,
                accept: Mutex::new(accept),
                connects: AtomicUsize::new(0),
                refuse: AtomicBool::new(false),
            }),
        }
    }

    /// Wait for the next client connection.
    pub async fn accept(&self) -> Option<MemoryPeer> {
        self.inner.accept.lock().await.recv().await
    }

    /// Number of connection attempts seen.
    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// Make subsequent connection attempts fail.
    pub fn refuse_connections(&self, refuse: bool) {
        self.inner.refuse.store(refuse, Ordering::SeqCst);
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusConnector for MemoryBus {
    async fn connect(&self, url: &str) -> AppResult<Box<dyn BusSocket>> {
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        if self.inner.refuse.load(Ordering::SeqCst) {
            return Err(AppError::network(format!("Connection refused: {url}")));
        }

        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();
        let peer = MemoryPeer {
            inbox: server_rx,
            outbox: Some(server_tx),
        };
        self.inner
            .incoming
            .send(peer)
            .map_err(|_| AppError::network("Memory bus has no listener"))?;
        debug!(url = %url, "Memory bus connection opened");

        Ok(Box::new(MemorySocket {
            outbox: Some(client_tx),
            inbox: client_rx,
        }))
    }
}

/// Server side of one in-memory connection.
#[derive(Debug)]
pub struct MemoryPeer {
    inbox: mpsc::UnboundedReceiver<String>,
    outbox: Option<mpsc::UnboundedSender<String>>,
}

impl MemoryPeer {
    /// Next frame from the client, skipping heart-beats. `None` once the
    /// client has closed.
    pub async fn recv_frame(&mut self) -> Option<StompFrame> {
        while let Some(text) = self.inbox.recv().await {
            if let Ok(Some(frame)) = StompFrame::decode(&text) {
                return Some(frame);
            }
        }
        None
    }

    /// Send a frame to the client.
    pub fn send_frame(&self, frame: &StompFrame) -> bool {
        self.send_raw(frame.encode())
    }

    /// Send raw text to the client.
    pub fn send_raw(&self, text: impl Into<String>) -> bool {
        self.outbox
            .as_ref()
            .is_some_and(|tx| tx.send(text.into()).is_ok())
    }

    /// Close the server side.
    pub fn close(&mut self) {
        self.outbox = None;
    }
}

struct MemorySocket {
    outbox: Option<mpsc::UnboundedSender<String>>,
    inbox: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl BusSocket for MemorySocket {
    async fn send(&mut self, text: String) -> AppResult<()> {
        let tx = self
            .outbox
            .as_ref()
            .ok_or_else(|| AppError::network("Socket is closed"))?;
        tx.send(text)
            .map_err(|_| AppError::network("Peer closed the connection"))
    }

    async fn recv(&mut self) -> Option<AppResult<String>> {
        self.inbox.recv().await.map(Ok)
    }

    async fn close(&mut self) -> AppResult<()> {
        self.outbox = None;
        self.inbox.close();
        Ok(())
    }
}
