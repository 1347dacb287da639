//! In-memory reference storage backend.
//!
//! `InMemoryStorage` keeps stream-indexed ordered event lists and
//! insertion-ordered snapshot lists behind shared `RwLock`s. Cloning a
//! handle shares the underlying state, so a store can be torn down and a new
//! one started over the same "persisted" data, which is how restart recovery
//! is exercised in tests. Useful for development and testing; durable
//! backends provide the same contract over real storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::{StorageError, StorageResult};
use crate::event::{RecordedEvent, Snapshot};
use crate::storage::{RevisionRange, Storage};
use crate::types::{StreamId, StreamRevision};

/// Thread-safe in-memory storage backend.
pub struct InMemoryStorage<P> {
    events: Arc<RwLock<HashMap<StreamId, Vec<RecordedEvent<P>>>>>,
    snapshots: Arc<RwLock<HashMap<StreamId, Vec<Snapshot>>>>,
}

impl<P> InMemoryStorage<P> {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(HashMap::new())),
            snapshots: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<P> Clone for InMemoryStorage<P> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
            snapshots: Arc::clone(&self.snapshots),
        }
    }
}

impl<P> Default for InMemoryStorage<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(operation: &'static str) -> StorageError {
    StorageError::Backend {
        operation,
        detail: "lock poisoned".to_string(),
    }
}

#[async_trait]
impl<P> Storage for InMemoryStorage<P>
where
    P: Clone + Send + Sync + 'static,
{
    type Payload = P;

    async fn add_events(&self, events: &[RecordedEvent<P>]) -> StorageResult<()> {
        let Some(first) = events.first() else {
            return Ok(());
        };

        for event in &events[1..] {
            if event.stream_id != first.stream_id {
                return Err(StorageError::MixedStreamBatch {
                    expected: first.stream_id.clone(),
                    found: event.stream_id.clone(),
                });
            }
        }

        let mut streams = self.events.write().map_err(|_| poisoned("add_events"))?;
        let log = streams.entry(first.stream_id.clone()).or_default();

        let expected = log
            .last()
            .map_or_else(StreamRevision::initial, |tail| tail.stream_revision.next());
        if first.stream_revision != expected {
            return Err(StorageError::RevisionConflict {
                stream: first.stream_id.clone(),
                expected,
                got: first.stream_revision,
            });
        }

        log.extend_from_slice(events);
        Ok(())
    }

    async fn add_snapshot(&self, snapshot: &Snapshot) -> StorageResult<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| poisoned("add_snapshot"))?;
        snapshots
            .entry(snapshot.stream_id.clone())
            .or_default()
            .push(snapshot.clone());
        Ok(())
    }

    async fn events(
        &self,
        stream_id: &StreamId,
        range: RevisionRange,
    ) -> StorageResult<Vec<RecordedEvent<P>>> {
        let streams = self.events.read().map_err(|_| poisoned("events"))?;
        Ok(streams
            .get(stream_id)
            .map(|log| {
                log.iter()
                    .filter(|event| range.contains(event.stream_revision))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn all_events(&self) -> StorageResult<Vec<RecordedEvent<P>>> {
        let streams = self.events.read().map_err(|_| poisoned("all_events"))?;
        let mut all: Vec<RecordedEvent<P>> = streams.values().flatten().cloned().collect();
        all.sort_by_key(|event| (event.commit_stamp, event.commit_sequence));
        Ok(all)
    }

    async fn event_range(
        &self,
        index: usize,
        amount: usize,
    ) -> StorageResult<Vec<RecordedEvent<P>>> {
        let mut all = self.all_events().await?;
        if index >= all.len() {
            return Ok(Vec::new());
        }
        all.truncate(index.saturating_add(amount).min(all.len()));
        Ok(all.split_off(index))
    }

    async fn snapshot(
        &self,
        stream_id: &StreamId,
        max_revision: Option<StreamRevision>,
    ) -> StorageResult<Option<Snapshot>> {
        let snapshots = self.snapshots.read().map_err(|_| poisoned("snapshot"))?;
        let Some(list) = snapshots.get(stream_id) else {
            return Ok(None);
        };
        let found = match max_revision {
            None => list.last(),
            Some(max) => list.iter().rev().find(|snapshot| snapshot.revision <= max),
        };
        Ok(found.cloned())
    }

    async fn undispatched_events(&self) -> StorageResult<Vec<RecordedEvent<P>>> {
        let streams = self
            .events
            .read()
            .map_err(|_| poisoned("undispatched_events"))?;
        let mut pending: Vec<RecordedEvent<P>> = streams
            .values()
            .flatten()
            .filter(|event| !event.dispatched)
            .cloned()
            .collect();
        // Commit order across streams, so recovery republishes in the order
        // the commits originally completed.
        pending.sort_by_key(|event| (event.commit_stamp, event.commit_sequence));
        Ok(pending)
    }

    async fn mark_dispatched(&self, event: &RecordedEvent<P>) -> StorageResult<()> {
        let mut streams = self
            .events
            .write()
            .map_err(|_| poisoned("mark_dispatched"))?;
        let stored = streams
            .get_mut(&event.stream_id)
            .and_then(|log| {
                log.iter_mut()
                    .find(|stored| stored.stream_revision == event.stream_revision)
            })
            .ok_or_else(|| StorageError::UnknownEvent {
                stream: event.stream_id.clone(),
                revision: event.stream_revision,
            })?;
        stored.dispatched = true;
        Ok(())
    }

    async fn fresh_id(&self) -> StorageResult<Uuid> {
        Ok(Uuid::now_v7())
    }
}
