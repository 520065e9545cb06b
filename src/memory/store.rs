//! In-memory document store with live subscriptions.

use crate::error::RemoteError;
use crate::remote::{CollectionObserver, DocumentStore, SubscriptionGuard};
use crate::types::{CollectionPath, CreatedAtField, Document, NewDocument, RecordId, ServerTimestamp};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

struct PathSubscriber {
    path: CollectionPath,
    observer: Arc<dyn CollectionObserver>,
}

/// Injected failures for exercising error paths. Taken once on use.
#[derive(Default)]
struct InjectedFailures {
    add: Option<RemoteError>,
    delete: Option<RemoteError>,
    subscribe: Option<RemoteError>,
}

/// Collection store holding documents in memory.
///
/// Subscribers receive the full current state of their path on subscribe
/// and after every mutation. Timestamps are assigned from a monotonic
/// server clock; document ids are never reused, deletion included.
pub struct MemoryStore {
    collections: Mutex<HashMap<CollectionPath, Vec<Document>>>,
    subscribers: Arc<Mutex<HashMap<u64, PathSubscriber>>>,
    next_subscription: AtomicU64,
    next_document: AtomicU64,
    /// Last assigned timestamp, in seconds.
    clock: Mutex<i64>,
    /// When set, mutations do not broadcast; `flush` delivers on demand.
    hold_deliveries: AtomicBool,
    inject: Mutex<InjectedFailures>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_subscription: AtomicU64::new(1),
            next_document: AtomicU64::new(1),
            clock: Mutex::new(0),
            hold_deliveries: AtomicBool::new(false),
            inject: Mutex::new(InjectedFailures::default()),
        }
    }

    /// Current documents for a path, in insertion order.
    pub fn documents(&self, path: &CollectionPath) -> Vec<Document> {
        self.collections.lock().get(path).cloned().unwrap_or_default()
    }

    /// Number of live subscriptions for a path.
    pub fn subscriber_count(&self, path: &CollectionPath) -> usize {
        self.subscribers
            .lock()
            .values()
            .filter(|sub| &sub.path == path)
            .count()
    }

    /// Pause or resume delivery on mutation.
    pub fn hold_deliveries(&self, hold: bool) {
        self.hold_deliveries.store(hold, Ordering::SeqCst);
    }

    /// Deliver the current state of a path to its subscribers.
    pub fn flush(&self, path: &CollectionPath) {
        self.broadcast(path);
    }

    /// Fail the next `add` with the given error.
    pub fn inject_add_error(&self, error: RemoteError) {
        self.inject.lock().add = Some(error);
    }

    /// Fail the next `delete` with the given error.
    pub fn inject_delete_error(&self, error: RemoteError) {
        self.inject.lock().delete = Some(error);
    }

    /// Fail the next `subscribe` with the given error.
    pub fn inject_subscribe_error(&self, error: RemoteError) {
        self.inject.lock().subscribe = Some(error);
    }

    /// Push a delivery error to a path's subscribers, as a backend would
    /// on a broken delivery.
    pub fn emit_error(&self, path: &CollectionPath, error: RemoteError) {
        for observer in self.observers_for(path) {
            observer.on_error(error.clone());
        }
    }

    /// Next server timestamp: wall clock, clamped strictly increasing.
    fn tick(&self) -> ServerTimestamp {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let mut clock = self.clock.lock();
        *clock = now.max(*clock + 1);
        ServerTimestamp(*clock)
    }

    fn observers_for(&self, path: &CollectionPath) -> Vec<Arc<dyn CollectionObserver>> {
        self.subscribers
            .lock()
            .values()
            .filter(|sub| &sub.path == path)
            .map(|sub| Arc::clone(&sub.observer))
            .collect()
    }

    /// Deliver the full current state to every subscriber of `path`.
    /// Observers are invoked outside the registry and collection locks.
    fn broadcast(&self, path: &CollectionPath) {
        let documents = self.documents(path);
        for observer in self.observers_for(path) {
            observer.on_snapshot(documents.clone());
        }
    }

    fn broadcast_unless_held(&self, path: &CollectionPath) {
        if !self.hold_deliveries.load(Ordering::SeqCst) {
            self.broadcast(path);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn subscribe(
        &self,
        path: &CollectionPath,
        observer: Arc<dyn CollectionObserver>,
    ) -> Result<SubscriptionGuard, RemoteError> {
        if let Some(err) = self.inject.lock().subscribe.take() {
            return Err(err);
        }

        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().insert(
            id,
            PathSubscriber {
                path: path.clone(),
                observer: Arc::clone(&observer),
            },
        );
        debug!(%path, subscription = id, "subscription opened");

        // Initial delivery of the current state.
        if !self.hold_deliveries.load(Ordering::SeqCst) {
            observer.on_snapshot(self.documents(path));
        }

        let subscribers = Arc::clone(&self.subscribers);
        Ok(SubscriptionGuard::new(move || {
            subscribers.lock().remove(&id);
        }))
    }

    fn add(&self, path: &CollectionPath, document: NewDocument) -> Result<RecordId, RemoteError> {
        if let Some(err) = self.inject.lock().add.take() {
            return Err(err);
        }

        let timestamp = match document.created_at {
            CreatedAtField::ServerTime => self.tick(),
        };
        let id = RecordId(format!("rec-{}", self.next_document.fetch_add(1, Ordering::SeqCst)));

        self.collections
            .lock()
            .entry(path.clone())
            .or_default()
            .push(Document {
                id: id.clone(),
                text: document.text,
                created_at: Some(timestamp),
            });
        debug!(%path, %id, "document added");

        self.broadcast_unless_held(path);
        Ok(id)
    }

    fn delete(&self, path: &CollectionPath, id: &RecordId) -> Result<(), RemoteError> {
        if let Some(err) = self.inject.lock().delete.take() {
            return Err(err);
        }

        {
            let mut collections = self.collections.lock();
            let documents = collections
                .get_mut(path)
                .ok_or_else(|| RemoteError::not_found(format!("no document {id}")))?;
            let position = documents
                .iter()
                .position(|doc| &doc.id == id)
                .ok_or_else(|| RemoteError::not_found(format!("no document {id}")))?;
            documents.remove(position);
        }
        debug!(%path, %id, "document deleted");

        self.broadcast_unless_held(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Identity;

    struct CollectingObserver {
        snapshots: Mutex<Vec<Vec<Document>>>,
        errors: Mutex<Vec<RemoteError>>,
    }

    impl CollectingObserver {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                snapshots: Mutex::new(Vec::new()),
                errors: Mutex::new(Vec::new()),
            })
        }
    }

    impl CollectionObserver for CollectingObserver {
        fn on_snapshot(&self, documents: Vec<Document>) {
            self.snapshots.lock().push(documents);
        }

        fn on_error(&self, error: RemoteError) {
            self.errors.lock().push(error);
        }
    }

    fn path() -> CollectionPath {
        CollectionPath::records("pad", &Identity::from("u1"))
    }

    #[test]
    fn test_subscribe_delivers_current_state() {
        let store = MemoryStore::new();
        store.add(&path(), NewDocument::text("first")).unwrap();

        let observer = CollectingObserver::new();
        let _guard = store
            .subscribe(&path(), Arc::clone(&observer) as Arc<dyn CollectionObserver>)
            .unwrap();

        let snapshots = observer.snapshots.lock();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].len(), 1);
    }

    #[test]
    fn test_every_mutation_delivers_full_state() {
        let store = MemoryStore::new();
        let observer = CollectingObserver::new();
        let _guard = store
            .subscribe(&path(), Arc::clone(&observer) as Arc<dyn CollectionObserver>)
            .unwrap();

        let id = store.add(&path(), NewDocument::text("one")).unwrap();
        store.add(&path(), NewDocument::text("two")).unwrap();
        store.delete(&path(), &id).unwrap();

        let snapshots = observer.snapshots.lock();
        // Initial + three mutations.
        assert_eq!(snapshots.len(), 4);
        assert_eq!(snapshots[3].len(), 1);
        assert_eq!(snapshots[3][0].text, "two");
    }

    #[test]
    fn test_timestamps_are_strictly_monotonic() {
        let store = MemoryStore::new();
        store.add(&path(), NewDocument::text("a")).unwrap();
        store.add(&path(), NewDocument::text("b")).unwrap();
        store.add(&path(), NewDocument::text("c")).unwrap();

        let stamps: Vec<_> = store
            .documents(&path())
            .into_iter()
            .map(|doc| doc.created_at.unwrap())
            .collect();
        assert!(stamps.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_document_ids_are_never_reused() {
        let store = MemoryStore::new();
        let first = store.add(&path(), NewDocument::text("a")).unwrap();
        store.delete(&path(), &first).unwrap();
        let second = store.add(&path(), NewDocument::text("b")).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_delete_unknown_id_reports_not_found() {
        let store = MemoryStore::new();
        store.add(&path(), NewDocument::text("a")).unwrap();

        let err = store.delete(&path(), &RecordId::from("missing")).unwrap_err();
        assert_eq!(err.kind, crate::error::RemoteErrorKind::NotFound);
    }

    #[test]
    fn test_released_guard_stops_deliveries() {
        let store = MemoryStore::new();
        let observer = CollectingObserver::new();
        let guard = store
            .subscribe(&path(), Arc::clone(&observer) as Arc<dyn CollectionObserver>)
            .unwrap();
        assert_eq!(store.subscriber_count(&path()), 1);

        guard.release();
        assert_eq!(store.subscriber_count(&path()), 0);

        store.add(&path(), NewDocument::text("unseen")).unwrap();
        assert_eq!(observer.snapshots.lock().len(), 1);
    }

    #[test]
    fn test_held_deliveries_flush_on_demand() {
        let store = MemoryStore::new();
        let observer = CollectingObserver::new();
        store.hold_deliveries(true);
        let _guard = store
            .subscribe(&path(), Arc::clone(&observer) as Arc<dyn CollectionObserver>)
            .unwrap();

        store.add(&path(), NewDocument::text("quiet")).unwrap();
        assert!(observer.snapshots.lock().is_empty());

        store.flush(&path());
        assert_eq!(observer.snapshots.lock().len(), 1);
    }

    #[test]
    fn test_emit_error_reaches_subscribers() {
        let store = MemoryStore::new();
        let observer = CollectingObserver::new();
        let _guard = store
            .subscribe(&path(), Arc::clone(&observer) as Arc<dyn CollectionObserver>)
            .unwrap();

        store.emit_error(&path(), RemoteError::unavailable("simulated outage"));
        assert_eq!(observer.errors.lock().len(), 1);
    }

    #[test]
    fn test_paths_are_isolated() {
        let store = MemoryStore::new();
        let other = CollectionPath::records("pad", &Identity::from("u2"));
        let observer = CollectingObserver::new();
        let _guard = store
            .subscribe(&other, Arc::clone(&observer) as Arc<dyn CollectionObserver>)
            .unwrap();

        store.add(&path(), NewDocument::text("not yours")).unwrap();

        let snapshots = observer.snapshots.lock();
        // Initial delivery only; the write to another path is invisible.
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].is_empty());
    }
}
