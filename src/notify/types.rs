//! Event types for live client updates.

use crate::types::SessionState;
use serde::{Deserialize, Serialize};

/// Configuration for an event subscription.
#[derive(Clone, Debug)]
pub struct EventsConfig {
    /// Max buffered events before the subscriber is dropped.
    /// Default: 1000
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: EventFilter,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            filter: EventFilter::all(),
        }
    }
}

/// Filter criteria for event subscriptions.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// Include session state transitions.
    pub include_session: bool,

    /// Include snapshot applications.
    pub include_snapshots: bool,

    /// Include surfaced subscription errors.
    pub include_errors: bool,
}

impl EventFilter {
    /// Snapshot applications only.
    pub fn snapshots() -> Self {
        Self {
            include_snapshots: true,
            ..Default::default()
        }
    }

    /// Session transitions only.
    pub fn session() -> Self {
        Self {
            include_session: true,
            ..Default::default()
        }
    }

    /// Surfaced errors only.
    pub fn errors() -> Self {
        Self {
            include_errors: true,
            ..Default::default()
        }
    }

    /// Everything.
    pub fn all() -> Self {
        Self {
            include_session: true,
            include_snapshots: true,
            include_errors: true,
        }
    }
}

/// Events emitted by the client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// The identity session changed state.
    Session { state: SessionState },

    /// A snapshot delivery replaced the cached records.
    SnapshotApplied { count: usize },

    /// A subscription delivery error was surfaced. The subscription
    /// stays open.
    SubscriptionError { message: String },

    /// Event subscription was dropped.
    Dropped { reason: DropReason },
}

/// Why an event subscription was dropped.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for an event subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventSubscriptionId(pub u64);

/// Handle for receiving events.
pub struct EventHandle {
    pub id: EventSubscriptionId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<ClientEvent>,
}

impl EventHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<ClientEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<ClientEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<ClientEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}
