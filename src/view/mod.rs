//! Live collection view: an ordered local cache of one identity's records.
//!
//! The view owns at most one store subscription at a time. Snapshot
//! deliveries are the only code path that writes the cache; every delivery
//! replaces it wholesale and re-applies the ordering invariant (descending
//! `created_at`, pending first). Applications are epoch-gated so that a
//! delivery from a closed or replaced subscription can never touch the
//! cache, even if the backend keeps invoking a stale observer.

use crate::error::{ClientError, Result};
use crate::notify::{ClientEvent, EventBus};
use crate::remote::{CollectionObserver, DocumentStore, SubscriptionGuard};
use crate::types::{CollectionPath, Document, Identity, Record};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// Mutable view state. All writes go through the lock; snapshot application
/// and lifecycle transitions never interleave.
struct ViewInner {
    /// Identity the cached records belong to.
    owner: Option<Identity>,

    /// Cached records, sorted by `created_at` descending, pending first.
    records: Vec<Record>,

    /// The single active subscription, if open.
    guard: Option<SubscriptionGuard>,

    /// Bumped on every open/close; deliveries tagged with an older epoch
    /// are discarded.
    epoch: u64,

    /// Whether a delivery has arrived since the last open.
    synced: bool,
}

/// Locally cached, ordered snapshot of an identity-scoped collection.
pub struct CollectionView {
    store: Arc<dyn DocumentStore>,
    namespace: String,
    events: Arc<EventBus>,
    inner: Arc<Mutex<ViewInner>>,
}

impl CollectionView {
    pub fn new(store: Arc<dyn DocumentStore>, namespace: impl Into<String>, events: Arc<EventBus>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            events,
            inner: Arc::new(Mutex::new(ViewInner {
                owner: None,
                records: Vec::new(),
                guard: None,
                epoch: 0,
                synced: false,
            })),
        }
    }

    /// Open a live subscription for `identity`.
    ///
    /// Idempotent: already open for the same identity is a no-op. Open for a
    /// different identity closes the previous subscription first and clears
    /// the cache — records never mix across identities.
    pub fn open(&self, identity: &Identity) -> Result<()> {
        let (previous, epoch) = {
            let mut inner = self.inner.lock();
            if inner.guard.is_some() && inner.owner.as_ref() == Some(identity) {
                return Ok(());
            }

            if inner.owner.as_ref() != Some(identity) {
                inner.records.clear();
            }
            inner.owner = Some(identity.clone());
            inner.epoch += 1;
            inner.synced = false;
            (inner.guard.take(), inner.epoch)
        };
        // Release the previous subscription before opening the next; the
        // view never runs two subscriptions concurrently.
        drop(previous);

        let path = CollectionPath::records(&self.namespace, identity);
        debug!(%path, "opening collection subscription");

        let applier = Arc::new(SnapshotApplier {
            inner: Arc::downgrade(&self.inner),
            epoch,
            events: Arc::clone(&self.events),
        });

        let guard = match self.store.subscribe(&path, applier) {
            Ok(guard) => guard,
            Err(err) => {
                warn!(error = %err, %path, "subscription failed");
                self.events.broadcast(ClientEvent::SubscriptionError {
                    message: err.to_string(),
                });
                return Err(ClientError::Subscription(err.to_string()));
            }
        };

        let mut inner = self.inner.lock();
        if inner.epoch == epoch {
            inner.guard = Some(guard);
        }
        // Else the view was closed or re-opened while subscribing; the
        // guard drops here and releases immediately.
        Ok(())
    }

    /// Release the subscription. Cached records stay visible but frozen;
    /// no delivery can alter them after this returns.
    pub fn close(&self) {
        let guard = {
            let mut inner = self.inner.lock();
            inner.epoch += 1;
            inner.synced = false;
            inner.guard.take()
        };
        if guard.is_some() {
            debug!("closing collection subscription");
        }
        drop(guard);
    }

    /// The cached records, ordered newest first.
    pub fn current_records(&self) -> Vec<Record> {
        self.inner.lock().records.clone()
    }

    /// Identity the cached records belong to.
    pub fn owner(&self) -> Option<Identity> {
        self.inner.lock().owner.clone()
    }

    /// Whether a subscription is active.
    pub fn is_open(&self) -> bool {
        self.inner.lock().guard.is_some()
    }

    /// Whether a delivery has arrived since the last open.
    pub fn is_synced(&self) -> bool {
        self.inner.lock().synced
    }
}

impl Drop for CollectionView {
    fn drop(&mut self) {
        self.close();
    }
}

/// The sole writer of the cache: applies one subscription's deliveries
/// while its epoch is current.
struct SnapshotApplier {
    inner: Weak<Mutex<ViewInner>>,
    epoch: u64,
    events: Arc<EventBus>,
}

impl CollectionObserver for SnapshotApplier {
    fn on_snapshot(&self, documents: Vec<Document>) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };

        let count = {
            let mut inner = inner.lock();
            if inner.epoch != self.epoch {
                debug!("discarding delivery for stale subscription");
                return;
            }

            let mut records: Vec<Record> = documents.into_iter().map(Record::from).collect();
            // Stable sort: ties keep store delivery order.
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            inner.records = records;
            inner.synced = true;
            inner.records.len()
        };

        self.events.broadcast(ClientEvent::SnapshotApplied { count });
    }

    fn on_error(&self, error: crate::error::RemoteError) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        if inner.lock().epoch != self.epoch {
            return;
        }

        // Surface only; the backend handles its own reconnection and the
        // subscription stays open.
        warn!(error = %error, "subscription delivery error");
        self.events.broadcast(ClientEvent::SubscriptionError {
            message: error.to_string(),
        });
    }
}
