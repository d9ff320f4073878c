//! Wake signal → refresh bridge.
//!
//! Registers the view as a client of the delivery context. Every
//! `push-update` signal re-runs the view's refresh routine, so the view
//! reloads authoritative state instead of trusting the push payload.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use orderfeed_core::types::ClientId;
use orderfeed_push::{ClientMessage, ClientRegistry};
use orderfeed_service::RefreshRoutine;

/// A mounted foreground client. Unmounts on drop.
#[derive(Debug)]
pub struct ForegroundBridge {
    registry: Arc<ClientRegistry>,
    client_id: ClientId,
    listener: JoinHandle<()>,
    mounted: AtomicBool,
    refreshes: Arc<AtomicUsize>,
}

impl ForegroundBridge {
    /// Register with `registry` and start listening for wake signals.
    pub fn mount(registry: Arc<ClientRegistry>, refresh: Arc<dyn RefreshRoutine>) -> Self {
        let (client_id, inbox) = registry.register();
        let refreshes = Arc::new(AtomicUsize::new(0));
        let listener = tokio::spawn(listen(client_id, inbox, refresh, Arc::clone(&refreshes)));
        info!(client_id = %client_id, "Foreground bridge mounted");
        Self {
            registry,
            client_id,
            listener,
            mounted: AtomicBool::new(true),
            refreshes,
        }
    }

    /// Client id assigned by the registry.
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Whether the bridge is still registered.
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Refreshes run so far.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Unregister and stop listening. Returns `false` if already unmounted.
    pub fn unmount(&self) -> bool {
        if !self.mounted.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.registry.unregister(self.client_id);
        self.listener.abort();
        info!(client_id = %self.client_id, "Foreground bridge unmounted");
        true
    }
}

impl Drop for ForegroundBridge {
    fn drop(&mut self) {
        self.unmount();
    }
}

async fn listen(
    client_id: ClientId,
    mut inbox: mpsc::Receiver<ClientMessage>,
    refresh: Arc<dyn RefreshRoutine>,
    refreshes: Arc<AtomicUsize>,
) {
    while let Some(message) = inbox.recv().await {
        match message {
            ClientMessage::PushUpdate => {
                // Signals queued meanwhile are covered by this refresh.
                let mut coalesced = 0usize;
                while inbox.try_recv().is_ok() {
                    coalesced += 1;
                }
                debug!(client_id = %client_id, coalesced = coalesced, "Wake signal received");

                match refresh.refresh().await {
                    Ok(()) => debug!(client_id = %client_id, "Refresh after wake signal done"),
                    Err(e) => warn!(client_id = %client_id, error = %e, "Refresh after wake signal failed"),
                }
                refreshes.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
    debug!(client_id = %client_id, "Foreground bridge inbox closed");
}
