//! End-to-end tests over the in-memory backends.

use notewire::{
    Client, ClientConfig, ClientEvent, CollectionPath, DocumentStore, EventsConfig, Identity,
    MemoryIdentityProvider, MemoryStore, NewDocument,
};
use std::sync::Arc;
use std::time::Duration;

fn client_over(store: &Arc<MemoryStore>) -> Client {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Client::new(
        ClientConfig {
            namespace: "pad".to_string(),
            credential: None,
        },
        Arc::new(MemoryIdentityProvider::new()),
        Arc::clone(store) as Arc<dyn DocumentStore>,
    )
}

fn records_path(identity: &Identity) -> CollectionPath {
    CollectionPath::records("pad", identity)
}

// --- Round Trips ---

#[test]
fn test_create_round_trips_through_subscription() {
    let store = Arc::new(MemoryStore::new());
    let client = client_over(&store);
    let identity = client.connect().unwrap();

    let id = client.create("Buy milk").unwrap();

    let records = client.current_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].text, "Buy milk");
    assert!(records[0].created_at.timestamp().is_some());

    // The store holds the same single document.
    assert_eq!(store.documents(&records_path(&identity)).len(), 1);
}

#[test]
fn test_delete_round_trips_through_subscription() {
    let store = Arc::new(MemoryStore::new());
    let client = client_over(&store);
    client.connect().unwrap();

    let id = client.create("short-lived").unwrap();
    assert_eq!(client.current_records().len(), 1);

    client.delete(&id).unwrap();
    assert!(client.current_records().is_empty());
}

#[test]
fn test_preexisting_records_arrive_in_one_snapshot() {
    let store = Arc::new(MemoryStore::new());
    // Two records already in the store before the client connects.
    let path = records_path(&Identity::from("anon-1"));
    store.add(&path, NewDocument::text("older")).unwrap();
    store.add(&path, NewDocument::text("newer")).unwrap();

    let client = client_over(&store);
    client.connect().unwrap();

    let records = client.current_records();
    assert_eq!(records.len(), 2);
    // Newest first.
    assert_eq!(records[0].text, "newer");
    assert_eq!(records[1].text, "older");
    assert!(records[0].created_at > records[1].created_at);
}

// --- Ordering ---

#[test]
fn test_records_stay_sorted_newest_first() {
    let store = Arc::new(MemoryStore::new());
    let client = client_over(&store);
    client.connect().unwrap();

    client.create("first").unwrap();
    client.create("second").unwrap();
    client.create("third").unwrap();

    let texts: Vec<_> = client
        .current_records()
        .into_iter()
        .map(|r| r.text)
        .collect();
    assert_eq!(texts, vec!["third", "second", "first"]);
}

// --- Single Writer ---

#[test]
fn test_mutations_never_write_the_cache_directly() {
    let store = Arc::new(MemoryStore::new());
    let client = client_over(&store);
    let identity = client.connect().unwrap();

    client.create("kept").unwrap();
    let before = client.current_records();

    // With the view closed the identity is still resolved, so mutations
    // still reach the store — but nothing may touch the cache.
    client.close();
    client.create("invisible").unwrap();

    assert_eq!(client.current_records(), before);
    assert_eq!(store.documents(&records_path(&identity)).len(), 2);
}

// --- Subscription Lifecycle ---

#[test]
fn test_connect_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let client = client_over(&store);
    let identity = client.connect().unwrap();
    client.connect().unwrap();

    assert_eq!(store.subscriber_count(&records_path(&identity)), 1);
}

#[test]
fn test_close_releases_the_subscription() {
    let store = Arc::new(MemoryStore::new());
    let client = client_over(&store);
    let identity = client.connect().unwrap();
    client.create("kept").unwrap();

    client.close();
    assert_eq!(store.subscriber_count(&records_path(&identity)), 0);

    // A late write delivers to nobody; the cache is frozen.
    store
        .add(&records_path(&identity), NewDocument::text("late"))
        .unwrap();
    assert_eq!(client.current_records().len(), 1);
}

// --- Events ---

#[test]
fn test_events_follow_the_lifecycle() {
    let store = Arc::new(MemoryStore::new());
    let client = client_over(&store);
    let handle = client.events(EventsConfig::default());

    client.connect().unwrap();
    client.create("one").unwrap();

    let mut saw_resolved = false;
    let mut snapshot_counts = Vec::new();
    while let Ok(event) = handle.recv_timeout(Duration::from_millis(100)) {
        match event {
            ClientEvent::Session { state } => {
                if matches!(state, notewire::SessionState::Resolved { .. }) {
                    saw_resolved = true;
                }
            }
            ClientEvent::SnapshotApplied { count } => snapshot_counts.push(count),
            _ => {}
        }
        if snapshot_counts.len() == 2 {
            break;
        }
    }

    assert!(saw_resolved);
    // Initial empty delivery, then the created record.
    assert_eq!(snapshot_counts, vec![0, 1]);
}
