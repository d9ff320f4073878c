//! Live order feed subscriber.
//!
//! Opens one bus connection per view, subscribes to the restaurant's order
//! topic, and prepends every inbound order to the shared [`OrderBoard`].
//! The connection is opened at most once and closed exactly once. Failures
//! are reported as [`FeedEvent::Error`] and never retried; the rest of the
//! view keeps working.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use orderfeed_core::config::LiveFeedConfig;
use orderfeed_core::error::AppError;
use orderfeed_core::result::AppResult;
use orderfeed_core::types::{OrderRecord, RestaurantId};
use orderfeed_service::OrderBoard;

use crate::connection::{LiveFeedConnection, TransportState};
use crate::event::FeedEvent;
use crate::frame::{StompCommand, StompFrame};
use crate::topic::FeedTopic;
use crate::transport::{BusConnector, BusSocket};

/// Subscription id used for the single topic subscription.
const SUBSCRIPTION_ID: &str = "sub-0";

/// Missed heart-beats tolerated before the connection counts as dead.
const HEARTBEAT_GRACE: u32 = 2;

/// State shared between the subscriber handle and its connection task.
#[derive(Debug)]
struct FeedShared {
    connection: LiveFeedConnection,
    connector: Arc<dyn BusConnector>,
    board: Arc<OrderBoard>,
    events: broadcast::Sender<FeedEvent>,
    /// Fired on deactivation.
    cancel: CancellationToken,
    /// Fired once the connection task (if any) has fully stopped.
    finished: CancellationToken,
    url: String,
    connect_timeout: Duration,
    heartbeat_ms: u64,
}

/// Handle to one live feed connection.
///
/// Dropping the handle deactivates the feed.
#[derive(Debug)]
pub struct LiveFeedSubscriber {
    shared: Arc<FeedShared>,
    activated: AtomicBool,
}

impl LiveFeedSubscriber {
    /// Create a subscriber for `identity`'s order topic.
    ///
    /// Returns `None` without a restaurant identity; nothing is opened then.
    pub fn new(
        identity: Option<RestaurantId>,
        connector: Arc<dyn BusConnector>,
        board: Arc<OrderBoard>,
        config: &LiveFeedConfig,
    ) -> Option<Self> {
        let Some(restaurant_id) = identity else {
            debug!("No restaurant identity, live feed not created");
            return None;
        };

        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        let topic = FeedTopic::RestaurantOrders(restaurant_id);
        Some(Self {
            shared: Arc::new(FeedShared {
                connection: LiveFeedConnection::new(topic),
                connector,
                board,
                events,
                cancel: CancellationToken::new(),
                finished: CancellationToken::new(),
                url: config.url.clone(),
                connect_timeout: Duration::from_secs(config.connect_timeout_seconds),
                heartbeat_ms: config.heartbeat_ms,
            }),
            activated: AtomicBool::new(false),
        })
    }

    /// Start the connection task. Only the first call does anything.
    ///
    /// Returns `false` if the feed was already activated or deactivated.
    pub fn activate(&self) -> bool {
        if self.activated.swap(true, Ordering::SeqCst) {
            debug!(topic = %self.topic(), "Live feed already activated");
            return false;
        }
        if self.shared.connection.state() == TransportState::Closed {
            return false;
        }

        info!(topic = %self.topic(), url = %self.shared.url, "Activating live feed");
        tokio::spawn(run(Arc::clone(&self.shared)));
        true
    }

    /// Close the feed. Idempotent; returns `true` only for the call that
    /// closed it. Does not wait for the connection task.
    pub fn deactivate(&self) -> bool {
        self.shared.cancel.cancel();
        let closed = self.shared.mark_closed();
        if !self.activated.load(Ordering::SeqCst) {
            self.shared.finished.cancel();
        }
        closed
    }

    /// Subscribed topic.
    pub fn topic(&self) -> FeedTopic {
        self.shared.connection.topic()
    }

    /// Current transport state.
    pub fn state(&self) -> TransportState {
        self.shared.connection.state()
    }

    /// How many times the connection has been closed.
    pub fn close_count(&self) -> usize {
        self.shared.connection.close_count()
    }

    /// Receive feed events from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<FeedEvent> {
        self.shared.events.subscribe()
    }

    /// Wait until the connection task has stopped.
    pub async fn wait_finished(&self) {
        self.shared.finished.cancelled().await;
    }
}

impl Drop for LiveFeedSubscriber {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl FeedShared {
    /// Close the connection state, announcing it once.
    fn mark_closed(&self) -> bool {
        if !self.connection.close() {
            return false;
        }
        let _ = self.events.send(FeedEvent::Closed);
        info!(topic = %self.connection.topic(), "Live feed closed");
        true
    }

    fn emit(&self, event: FeedEvent) {
        // No receivers is fine; views may not listen.
        let _ = self.events.send(event);
    }

    /// Dial the bus. `None` when deactivated first.
    async fn dial(&self) -> AppResult<Option<Box<dyn BusSocket>>> {
        let dialed = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(None),
            dialed = timeout(self.connect_timeout, self.connector.connect(&self.url)) => dialed,
        };
        match dialed {
            Ok(socket) => socket.map(Some),
            Err(_) => Err(AppError::network(format!(
                "Timed out connecting to {}",
                self.url
            ))),
        }
    }

    /// Handshake, subscribe, then process frames until cancelled or failed.
    async fn pump(&self, socket: &mut dyn BusSocket) -> AppResult<()> {
        let topic = self.connection.topic();
        socket
            .send(StompFrame::connect(host_of(&self.url), self.heartbeat_ms).encode())
            .await?;

        let handshake = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            done = timeout(self.connect_timeout, await_connected(&mut *socket)) => Some(done),
        };
        let connected = match handshake {
            None => return Ok(()),
            Some(Err(_)) => return Err(AppError::network("Timed out waiting for CONNECTED")),
            Some(Ok(done)) => done?,
        };
        let idle_limit = connected
            .incoming_heartbeat(self.heartbeat_ms)
            .map(|interval| interval * HEARTBEAT_GRACE);
        debug!(idle_limit = ?idle_limit, "Heart-beat negotiated");

        if !self.connection.mark_open() {
            return Ok(());
        }
        socket
            .send(StompFrame::subscribe(SUBSCRIPTION_ID, &topic.to_destination()).encode())
            .await?;
        info!(topic = %topic, "Live feed subscribed");
        self.emit(FeedEvent::Connected { topic });

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                next = recv_within(&mut *socket, idle_limit) => Some(next),
            };
            match next {
                None => {
                    let _ = socket.send(StompFrame::unsubscribe(SUBSCRIPTION_ID).encode()).await;
                    let _ = socket.send(StompFrame::disconnect().encode()).await;
                    return Ok(());
                }
                Some(None) => return Err(AppError::network("Bus closed the connection")),
                Some(Some(Err(e))) => return Err(e),
                Some(Some(Ok(text))) => self.handle_text(&text).await?,
            }
        }
    }

    /// Apply one inbound message. Malformed input is logged and dropped.
    async fn handle_text(&self, text: &str) -> AppResult<()> {
        let frame = match StompFrame::decode(text) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                trace!("Heart-beat");
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "Malformed bus frame dropped");
                return Ok(());
            }
        };

        match frame.command {
            StompCommand::Message => {
                let expected = self.connection.topic().to_destination();
                if frame.header("destination").is_some_and(|d| d != expected) {
                    debug!(destination = ?frame.header("destination"), "Message for another topic ignored");
                    return Ok(());
                }
                match serde_json::from_str::<OrderRecord>(&frame.body) {
                    Ok(order) => {
                        info!(order_id = %order.order_id, status = %order.status, "Order received from live feed");
                        self.board.prepend(order.clone()).await;
                        self.emit(FeedEvent::Order(order));
                    }
                    Err(e) => warn!(error = %e, "Malformed order payload dropped"),
                }
                Ok(())
            }
            StompCommand::Error => Err(stomp_error(&frame)),
            other => {
                debug!(command = %other, "Bus frame ignored");
                Ok(())
            }
        }
    }
}

async fn run(shared: Arc<FeedShared>) {
    let result = session(&shared).await;
    if let Err(e) = result {
        if !shared.cancel.is_cancelled() {
            warn!(topic = %shared.connection.topic(), error = %e, "Live feed failed");
            shared.emit(FeedEvent::Error(e.message.clone()));
        }
    }
    shared.mark_closed();
    shared.finished.cancel();
}

async fn session(shared: &FeedShared) -> AppResult<()> {
    let Some(mut socket) = shared.dial().await? else {
        return Ok(());
    };
    let result = shared.pump(socket.as_mut()).await;
    if let Err(e) = socket.close().await {
        debug!(error = %e, "Bus socket close failed");
    }
    result
}

/// Next inbound text. Silence longer than `idle_limit` fails the connection.
async fn recv_within(
    socket: &mut dyn BusSocket,
    idle_limit: Option<Duration>,
) -> Option<AppResult<String>> {
    let Some(limit) = idle_limit else {
        return socket.recv().await;
    };
    match timeout(limit, socket.recv()).await {
        Ok(next) => next,
        Err(_) => Some(Err(AppError::network(format!(
            "No data from bus for {} ms",
            limit.as_millis()
        )))),
    }
}

/// Read until CONNECTED. An ERROR frame or a closed socket fails the handshake.
async fn await_connected(socket: &mut dyn BusSocket) -> AppResult<StompFrame> {
    loop {
        let text = match socket.recv().await {
            Some(text) => text?,
            None => return Err(AppError::network("Bus closed the connection during handshake")),
        };
        match StompFrame::decode(&text) {
            Ok(Some(frame)) if frame.command == StompCommand::Connected => {
                debug!(version = ?frame.header("version"), "STOMP session established");
                return Ok(frame);
            }
            Ok(Some(frame)) if frame.command == StompCommand::Error => {
                return Err(stomp_error(&frame));
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Malformed bus frame dropped"),
        }
    }
}

fn stomp_error(frame: &StompFrame) -> AppError {
    let detail = frame
        .header("message")
        .map(str::to_string)
        .unwrap_or_else(|| frame.body.clone());
    AppError::network(format!("STOMP error: {detail}"))
}

/// Host part of a bus URL, for the CONNECT frame.
fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', ':']).next().unwrap_or(rest)
}
