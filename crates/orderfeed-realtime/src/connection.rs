//! Live feed connection state.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use crate::topic::FeedTopic;

/// Transport lifecycle. Moves only forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Dialing or handshaking.
    Connecting,
    /// Subscribed and receiving.
    Open,
    /// Closed; never reopened.
    Closed,
}

impl TransportState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Connecting,
            1 => Self::Open,
            _ => Self::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closed => 2,
        }
    }
}

/// State of one live feed connection bound to a topic.
#[derive(Debug)]
pub struct LiveFeedConnection {
    topic: FeedTopic,
    state: AtomicU8,
    closes: AtomicUsize,
}

impl LiveFeedConnection {
    /// New connection in the `Connecting` state.
    pub fn new(topic: FeedTopic) -> Self {
        Self {
            topic,
            state: AtomicU8::new(TransportState::Connecting.as_u8()),
            closes: AtomicUsize::new(0),
        }
    }

    /// Subscribed topic.
    pub fn topic(&self) -> FeedTopic {
        self.topic
    }

    /// Current state.
    pub fn state(&self) -> TransportState {
        TransportState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// `Connecting → Open`. Returns `false` if the connection was closed first.
    pub fn mark_open(&self) -> bool {
        self.state
            .compare_exchange(
                TransportState::Connecting.as_u8(),
                TransportState::Open.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Move to `Closed`. Returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        let previous = self
            .state
            .swap(TransportState::Closed.as_u8(), Ordering::SeqCst);
        if previous == TransportState::Closed.as_u8() {
            return false;
        }
        self.closes.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// How many times the connection was closed. At most one.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}
