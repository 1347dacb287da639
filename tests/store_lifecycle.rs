//! End-to-end tests for the load, append, commit, snapshot lifecycle.

use std::time::Duration;

use eventvault::{EventStore, InMemoryStorage, RevisionRange, StreamId, StreamRevision};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Interval long enough that the dispatcher never ticks during a test; the
/// first tick fires at startup, before anything is committed.
const PARKED: Duration = Duration::from_secs(3600);

fn stream_id(name: &str) -> StreamId {
    StreamId::try_new(name).expect("valid stream id")
}

#[tokio::test]
async fn committing_a_batch_assigns_dense_revisions_and_shared_identity() {
    // Given: a store over an inspectable backend
    let storage: InMemoryStorage<String> = InMemoryStorage::new();
    let mut store = EventStore::builder()
        .storage(storage.clone())
        .publishing_interval(PARKED)
        .build()
        .await
        .expect("store starts");

    // When: two payloads are committed to an empty stream
    let mut stream = store
        .stream(stream_id("A"), RevisionRange::all())
        .await
        .unwrap();
    stream.add_event("p1".to_string());
    stream.add_event("p2".to_string());
    store.commit(&mut stream).await.unwrap();

    // Then: the persisted events carry revisions 0 and 1, one commit id,
    // commit sequences 0 and 1, and are not yet dispatched
    let persisted = store
        .stream(stream_id("A"), RevisionRange::all())
        .await
        .unwrap();
    let events = persisted.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].stream_revision, StreamRevision::new(0));
    assert_eq!(events[1].stream_revision, StreamRevision::new(1));
    assert_eq!(events[0].commit_id, events[1].commit_id);
    assert_eq!(events[0].commit_stamp, events[1].commit_stamp);
    assert_eq!(events[0].commit_sequence, 0);
    assert_eq!(events[1].commit_sequence, 1);
    assert!(events.iter().all(|event| !event.dispatched));

    store.stop().await;
}

#[tokio::test]
async fn a_second_commit_continues_revisions_under_a_new_commit_id() {
    let storage: InMemoryStorage<String> = InMemoryStorage::new();
    let mut store = EventStore::builder()
        .storage(storage)
        .publishing_interval(PARKED)
        .build()
        .await
        .unwrap();

    // Given: a stream with one committed batch
    let mut first = store
        .stream(stream_id("A"), RevisionRange::all())
        .await
        .unwrap();
    first.add_event("p1".to_string());
    first.add_event("p2".to_string());
    store.commit(&mut first).await.unwrap();

    // When: the stream is loaded again and a third payload is committed
    let mut second = store
        .stream(stream_id("A"), RevisionRange::all())
        .await
        .unwrap();
    second.add_event("p3".to_string());
    store.commit(&mut second).await.unwrap();

    // Then: the new event holds revision 2 and a distinct commit id
    let events = second.events();
    assert_eq!(events[2].stream_revision, StreamRevision::new(2));
    assert_ne!(events[2].commit_id, events[0].commit_id);
    assert_eq!(events[2].commit_sequence, 0);

    store.stop().await;
}

#[tokio::test]
async fn a_snapshot_shortcuts_replay_to_the_tail() {
    let mut store: EventStore<String> = EventStore::builder()
        .publishing_interval(PARKED)
        .build()
        .await
        .unwrap();

    // Given: three committed events and a snapshot at revision 1
    let mut stream = store
        .stream(stream_id("A"), RevisionRange::all())
        .await
        .unwrap();
    stream.add_event("p1".to_string());
    stream.add_event("p2".to_string());
    stream.add_event("p3".to_string());
    store.commit(&mut stream).await.unwrap();

    store
        .create_snapshot(stream_id("A"), StreamRevision::new(1), json!({"state": "x"}))
        .await
        .unwrap();

    // When: the stream is loaded from its latest snapshot
    let (snapshot, tail) = store.stream_from_snapshot(stream_id("A"), None).await.unwrap();

    // Then: the snapshot covers revision 1 and the tail is exactly the
    // event at revision 2
    let snapshot = snapshot.expect("snapshot present");
    assert_eq!(snapshot.revision, StreamRevision::new(1));
    assert_eq!(tail.events().len(), 1);
    assert_eq!(tail.events()[0].stream_revision, StreamRevision::new(2));
    assert!(snapshot.revision < tail.events()[0].stream_revision);
    assert_eq!(tail.events()[0].payload, "p3");

    store.stop().await;
}

#[tokio::test]
async fn snapshot_loading_honours_a_revision_ceiling() {
    let mut store: EventStore<String> = EventStore::builder()
        .publishing_interval(PARKED)
        .build()
        .await
        .unwrap();

    let mut stream = store
        .stream(stream_id("A"), RevisionRange::all())
        .await
        .unwrap();
    for payload in ["p0", "p1", "p2", "p3", "p4"] {
        stream.add_event(payload.to_string());
    }
    store.commit(&mut stream).await.unwrap();

    store
        .create_snapshot(stream_id("A"), StreamRevision::new(1), json!({"n": 2}))
        .await
        .unwrap();
    store
        .create_snapshot(stream_id("A"), StreamRevision::new(3), json!({"n": 4}))
        .await
        .unwrap();

    // A ceiling of revision 2 selects the older snapshot and a tail
    // covering revision 2 only.
    let (snapshot, tail) = store
        .stream_from_snapshot(stream_id("A"), Some(StreamRevision::new(2)))
        .await
        .unwrap();
    assert_eq!(snapshot.unwrap().revision, StreamRevision::new(1));
    let revisions: Vec<_> = tail.events().iter().map(|e| e.stream_revision).collect();
    assert_eq!(revisions, vec![StreamRevision::new(2)]);

    store.stop().await;
}

#[tokio::test]
async fn committed_payloads_survive_a_round_trip() {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum CartEvent {
        ItemAdded { sku: String, quantity: u32 },
        CheckedOut,
    }

    let mut store: EventStore<CartEvent> = EventStore::builder()
        .publishing_interval(PARKED)
        .build()
        .await
        .unwrap();

    let added = CartEvent::ItemAdded {
        sku: "sku-9".to_string(),
        quantity: 3,
    };
    let mut stream = store
        .stream(stream_id("cart-1"), RevisionRange::all())
        .await
        .unwrap();
    stream.add_event(added.clone());
    stream.add_event_with_header(CartEvent::CheckedOut, json!({"terminal": "t-4"}));
    store.commit(&mut stream).await.unwrap();

    let loaded = store
        .stream(stream_id("cart-1"), RevisionRange::all())
        .await
        .unwrap();
    assert_eq!(loaded.events()[0].payload, added);
    assert_eq!(loaded.events()[1].header, Some(json!({"terminal": "t-4"})));

    store.stop().await;
}

#[tokio::test]
async fn diagnostics_expose_the_global_log() {
    let mut store: EventStore<String> = EventStore::builder()
        .publishing_interval(PARKED)
        .build()
        .await
        .unwrap();

    let mut a = store.stream(stream_id("A"), RevisionRange::all()).await.unwrap();
    a.add_event("a0".to_string());
    store.commit(&mut a).await.unwrap();

    let mut b = store.stream(stream_id("B"), RevisionRange::all()).await.unwrap();
    b.add_event("b0".to_string());
    b.add_event("b1".to_string());
    store.commit(&mut b).await.unwrap();

    let all = store.all_events().await.unwrap();
    assert_eq!(all.len(), 3);
    let payloads: Vec<_> = all.iter().map(|e| e.payload.as_str()).collect();
    assert_eq!(payloads, vec!["a0", "b0", "b1"]);

    let window = store.event_range(1, 2).await.unwrap();
    let payloads: Vec<_> = window.iter().map(|e| e.payload.as_str()).collect();
    assert_eq!(payloads, vec!["b0", "b1"]);

    store.stop().await;
}
