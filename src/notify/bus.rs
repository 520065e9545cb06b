//! Event bus broadcasting client events to subscribers.

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{ClientEvent, DropReason, EventFilter, EventHandle, EventSubscriptionId, EventsConfig};

/// Internal subscriber state.
struct Subscriber {
    filter: EventFilter,
    sender: Sender<ClientEvent>,
}

impl Subscriber {
    /// Try to send an event. Returns false if the buffer is full or the
    /// receiver is gone (subscriber will be dropped).
    fn try_send(&self, event: ClientEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }

    fn wants(&self, event: &ClientEvent) -> bool {
        match event {
            ClientEvent::Session { .. } => self.filter.include_session,
            ClientEvent::SnapshotApplied { .. } => self.filter.include_snapshots,
            ClientEvent::SubscriptionError { .. } => self.filter.include_errors,
            // Lifecycle notices always go through.
            ClientEvent::Dropped { .. } => true,
        }
    }
}

/// Broadcasts client events to filtered, bounded subscribers.
pub struct EventBus {
    subscribers: RwLock<HashMap<EventSubscriptionId, Subscriber>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new event subscription.
    pub fn subscribe(&self, config: EventsConfig) -> EventHandle {
        let id = EventSubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size);

        self.subscribers.write().insert(
            id,
            Subscriber {
                filter: config.filter,
                sender,
            },
        );

        EventHandle { id, receiver }
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: EventSubscriptionId) {
        let mut subs = self.subscribers.write();
        if let Some(sub) = subs.remove(&id) {
            // Best effort drop notice.
            let _ = sub.sender.try_send(ClientEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    /// Number of live event subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Broadcast an event to matching subscribers. Subscribers that fail to
    /// receive are dropped.
    pub fn broadcast(&self, event: ClientEvent) {
        let mut to_remove = Vec::new();

        {
            let subs = self.subscribers.read();
            for (id, sub) in subs.iter() {
                if sub.wants(&event) && !sub.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut subs = self.subscribers.write();
            for id in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    // Might fail if the buffer is still full, that's ok.
                    let _ = sub.sender.try_send(ClientEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
