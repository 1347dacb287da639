//! The store coordinator: commit protocol, stream loading, snapshots.

use std::sync::Arc;
use std::time::Duration;

use crate::dispatch::Dispatcher;
use crate::errors::StoreResult;
use crate::event::{RecordedEvent, Snapshot};
use crate::logging::{ConsoleLogger, Logger, TracingLogger};
use crate::memory::InMemoryStorage;
use crate::publish::{NoopPublisher, Publisher};
use crate::storage::{RevisionRange, Storage};
use crate::stream::EventStream;
use crate::types::{CommitId, SnapshotId, StreamId, StreamRevision, Timestamp};

/// Tunables recognized by the store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How often the dispatcher polls its backlog.
    pub publishing_interval: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            publishing_interval: Duration::from_millis(100),
        }
    }
}

/// Binds collaborator roles and starts an [`EventStore`].
///
/// Each role has one binder; a role left unbound is filled with a default at
/// [`build`](Self::build): in-memory storage, a no-op publisher, and a
/// `tracing`-backed logger. One object can fill several roles by being bound
/// to each of them.
///
/// ```rust,ignore
/// let store = EventStore::builder()
///     .storage(InMemoryStorage::new())
///     .publisher(MyBusPublisher::connect(url))
///     .publishing_interval(Duration::from_millis(50))
///     .build()
///     .await?;
/// ```
pub struct EventStoreBuilder<P> {
    storage: Option<Arc<dyn Storage<Payload = P>>>,
    publisher: Option<Arc<dyn Publisher<Payload = P>>>,
    logger: Option<Arc<dyn Logger>>,
    options: StoreOptions,
}

impl<P> EventStoreBuilder<P>
where
    P: Clone + Send + Sync + 'static,
{
    /// Creates a builder with every role unbound.
    pub fn new() -> Self {
        Self {
            storage: None,
            publisher: None,
            logger: None,
            options: StoreOptions::default(),
        }
    }

    /// Binds the storage role.
    #[must_use]
    pub fn storage(mut self, storage: impl Storage<Payload = P> + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Binds the publisher role.
    #[must_use]
    pub fn publisher(mut self, publisher: impl Publisher<Payload = P> + 'static) -> Self {
        self.publisher = Some(Arc::new(publisher));
        self
    }

    /// Binds the logger role.
    #[must_use]
    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Binds the built-in console logger.
    #[must_use]
    pub fn console_logger(self) -> Self {
        self.logger(ConsoleLogger)
    }

    /// Sets how often the dispatcher polls its backlog.
    #[must_use]
    pub const fn publishing_interval(mut self, interval: Duration) -> Self {
        self.options.publishing_interval = interval;
        self
    }

    /// Fills unbound roles with defaults and starts the store.
    ///
    /// Starting includes dispatcher recovery: events persisted as
    /// undispatched by an earlier process are scheduled for republish before
    /// any new commit is accepted.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the recovery scan fails.
    pub async fn build(self) -> StoreResult<EventStore<P>> {
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(InMemoryStorage::new()));
        let publisher = self
            .publisher
            .unwrap_or_else(|| Arc::new(NoopPublisher::new()));
        let logger = self.logger.unwrap_or_else(|| Arc::new(TracingLogger));

        let dispatcher = Dispatcher::start(
            Arc::clone(&storage),
            publisher,
            Arc::clone(&logger),
            self.options.publishing_interval,
        )
        .await?;
        logger.debug("event store started");

        Ok(EventStore {
            storage,
            logger,
            dispatcher,
        })
    }
}

impl<P> Default for EventStoreBuilder<P>
where
    P: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The event store: revisioned append-only streams with snapshots and
/// reliable background dispatch.
///
/// Constructed through [`EventStore::builder`]. Callers load an
/// [`EventStream`], append payloads to it and commit; the commit protocol
/// seals the batch with a shared commit identity and gap-free stream
/// revisions, persists it in a single storage append, and enqueues it for
/// dispatch.
pub struct EventStore<P> {
    storage: Arc<dyn Storage<Payload = P>>,
    logger: Arc<dyn Logger>,
    dispatcher: Dispatcher<P>,
}

impl<P> EventStore<P>
where
    P: Clone + Send + Sync + 'static,
{
    /// Starts configuring a store.
    pub fn builder() -> EventStoreBuilder<P> {
        EventStoreBuilder::new()
    }

    /// Loads a stream's events within `range` into a fresh working set.
    ///
    /// Every call produces an independent [`EventStream`]; instances are
    /// never shared between callers.
    pub async fn stream(
        &self,
        stream_id: StreamId,
        range: RevisionRange,
    ) -> StoreResult<EventStream<P>> {
        let events = self.storage.events(&stream_id, range).await?;
        Ok(EventStream::hydrated(stream_id, events))
    }

    /// Loads the latest qualifying snapshot and the event tail after it.
    ///
    /// The snapshot is the newest one with `revision <= max_revision`
    /// (`None` for the newest overall). The returned stream covers the
    /// revisions after the snapshot up to and including `max_revision`; with
    /// no snapshot it starts at revision 0.
    pub async fn stream_from_snapshot(
        &self,
        stream_id: StreamId,
        max_revision: Option<StreamRevision>,
    ) -> StoreResult<(Option<Snapshot>, EventStream<P>)> {
        let snapshot = self.storage.snapshot(&stream_id, max_revision).await?;
        let from = snapshot
            .as_ref()
            .map_or_else(StreamRevision::initial, |snapshot| snapshot.revision.next());
        let range = RevisionRange::new(from, max_revision.map(StreamRevision::next));
        let stream = self.stream(stream_id, range).await?;
        Ok((snapshot, stream))
    }

    /// Captures an aggregate state at `revision` as a new snapshot.
    ///
    /// Acquires a fresh id from storage, assembles the record and persists
    /// it. Snapshots are never taken at a revision below an existing one for
    /// the same stream; the store does not rewrite history.
    pub async fn create_snapshot(
        &self,
        stream_id: StreamId,
        revision: StreamRevision,
        data: serde_json::Value,
    ) -> StoreResult<Snapshot> {
        let id = SnapshotId::new(self.storage.fresh_id().await?);
        let snapshot = Snapshot::new(id, stream_id, revision, data);
        self.storage.add_snapshot(&snapshot).await?;
        Ok(snapshot)
    }

    /// Commits the stream's pending events as one atomic batch.
    ///
    /// Every pending event is sealed in append order with the same fresh
    /// commit id and commit stamp, a dense commit sequence from 0, and a
    /// stream revision continuing the loaded committed tail. The batch is
    /// persisted in a single storage append, enqueued on the dispatcher and
    /// moved into the stream's committed list. With nothing pending the call
    /// is a no-op.
    ///
    /// Commit serialization per stream is the caller's responsibility: two
    /// concurrently loaded working sets committing to the same stream race,
    /// and the slower one is refused by the backend's tail check rather than
    /// interleaving revisions.
    ///
    /// # Errors
    ///
    /// Surfaces the storage error unchanged; the stream keeps its pending
    /// events so the caller can reload and retry.
    #[tracing::instrument(skip(self, stream), fields(stream_id = %stream.stream_id()))]
    pub async fn commit(&self, stream: &mut EventStream<P>) -> StoreResult<()> {
        if stream.uncommitted_events().is_empty() {
            return Ok(());
        }

        let commit_id = CommitId::new(self.storage.fresh_id().await?);
        let commit_stamp = Timestamp::now();
        let mut revision = stream
            .current_revision()
            .map_or_else(StreamRevision::initial, StreamRevision::next);

        let mut sealed = Vec::with_capacity(stream.uncommitted_events().len());
        for (sequence, pending) in stream.uncommitted_events().iter().enumerate() {
            sealed.push(pending.clone().seal(
                stream.stream_id().clone(),
                revision,
                commit_id,
                sequence as u32,
                commit_stamp,
            ));
            revision = revision.next();
        }

        let batch_len = sealed.len();
        self.storage.add_events(&sealed).await?;
        self.dispatcher.add_undispatched_events(sealed.clone());
        stream.finish_commit(sealed);

        self.logger.debug(&format!(
            "committed {batch_len} event(s) to stream '{}' as commit {commit_id}",
            stream.stream_id()
        ));
        Ok(())
    }

    /// Every event across every stream, ascending by commit stamp.
    ///
    /// Diagnostics pass-through; not a production read path.
    pub async fn all_events(&self) -> StoreResult<Vec<RecordedEvent<P>>> {
        Ok(self.storage.all_events().await?)
    }

    /// A window over the commit-stamp-sorted global log.
    ///
    /// Diagnostics pass-through; not a production read path.
    pub async fn event_range(
        &self,
        index: usize,
        amount: usize,
    ) -> StoreResult<Vec<RecordedEvent<P>>> {
        Ok(self.storage.event_range(index, amount).await?)
    }

    /// Events not yet successfully published, as reported by storage.
    pub async fn undispatched_events(&self) -> StoreResult<Vec<RecordedEvent<P>>> {
        Ok(self.storage.undispatched_events().await?)
    }

    /// Stops the dispatcher after its current tick and waits for it.
    ///
    /// Queued events stay `dispatched = false` in storage and are recovered
    /// by the next store that starts over the same backend.
    pub async fn stop(&mut self) {
        self.dispatcher.stop().await;
        self.logger.debug("event store stopped");
    }
}
