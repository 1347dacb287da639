//! The storage backend contract.
//!
//! `Storage` is the swappable persistence port of the store: an append-only
//! event log per stream, a snapshot list per stream, an undispatched-event
//! scan, and an id factory. The in-memory reference implementation lives in
//! [`memory`](crate::memory); durable backends implement the same trait over
//! their native transaction primitives while preserving the ordering and
//! revision semantics documented here.

use crate::errors::StorageResult;
use crate::event::{RecordedEvent, Snapshot};
use crate::types::{StreamId, StreamRevision};
use async_trait::async_trait;
use uuid::Uuid;

/// A half-open range of stream revisions, `[from, to)`.
///
/// An unbounded upper end (`to = None`) reads to the end of the stream.
/// Ranges select events by their `stream_revision` value. Under the commit
/// protocol revisions are dense from 0, so revision values and log positions
/// coincide; querying by value keeps the semantics exact for backends where
/// they might not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionRange {
    from: StreamRevision,
    to: Option<StreamRevision>,
}

impl RevisionRange {
    /// The whole stream.
    pub fn all() -> Self {
        Self {
            from: StreamRevision::initial(),
            to: None,
        }
    }

    /// Everything at or after `from`.
    pub const fn starting_at(from: StreamRevision) -> Self {
        Self { from, to: None }
    }

    /// `[from, to)`, with `None` meaning unbounded above.
    pub const fn new(from: StreamRevision, to: Option<StreamRevision>) -> Self {
        Self { from, to }
    }

    /// The inclusive lower bound.
    pub const fn from(&self) -> StreamRevision {
        self.from
    }

    /// The exclusive upper bound, if any.
    pub const fn to(&self) -> Option<StreamRevision> {
        self.to
    }

    /// Whether `revision` falls inside this range.
    pub fn contains(&self, revision: StreamRevision) -> bool {
        revision >= self.from && self.to.map_or(true, |to| revision < to)
    }
}

/// The capability set a storage backend must provide.
///
/// Backends are shared between the coordinator and the dispatcher and must
/// tolerate concurrent calls. Every operation may fail with a backend error;
/// partial state is never observable to callers.
#[async_trait]
pub trait Storage: Send + Sync {
    /// The opaque event payload type this backend persists.
    type Payload: Send + Sync;

    /// Appends an ordered batch of sealed events to one stream.
    ///
    /// All events of a batch must belong to the stream of the first event,
    /// and the batch must extend the stream's current tail without gaps. An
    /// empty batch is a successful no-op. Append preserves batch order.
    async fn add_events(&self, events: &[RecordedEvent<Self::Payload>]) -> StorageResult<()>;

    /// Appends a snapshot to the stream's insertion-ordered snapshot list.
    async fn add_snapshot(&self, snapshot: &Snapshot) -> StorageResult<()>;

    /// Reads a stream's events within `range`, in revision order.
    ///
    /// An unknown stream yields an empty list.
    async fn events(
        &self,
        stream_id: &StreamId,
        range: RevisionRange,
    ) -> StorageResult<Vec<RecordedEvent<Self::Payload>>>;

    /// Every event across every stream, ascending by commit stamp.
    ///
    /// A diagnostics aid, not a production read path.
    async fn all_events(&self) -> StorageResult<Vec<RecordedEvent<Self::Payload>>>;

    /// A window of at most `amount` events starting at `index` over the
    /// commit-stamp-sorted global log.
    ///
    /// Like [`all_events`](Self::all_events), best-effort diagnostics only.
    async fn event_range(
        &self,
        index: usize,
        amount: usize,
    ) -> StorageResult<Vec<RecordedEvent<Self::Payload>>>;

    /// The latest snapshot whose revision is at most `max_revision`, or the
    /// newest snapshot when `max_revision` is `None`.
    async fn snapshot(
        &self,
        stream_id: &StreamId,
        max_revision: Option<StreamRevision>,
    ) -> StorageResult<Option<Snapshot>>;

    /// All events still carrying `dispatched = false`.
    ///
    /// The order is backend-chosen but stable within a call; the reference
    /// backend returns commit order.
    async fn undispatched_events(&self) -> StorageResult<Vec<RecordedEvent<Self::Payload>>>;

    /// Marks the event dispatched.
    ///
    /// The transition is visible to every later
    /// [`undispatched_events`](Self::undispatched_events) call.
    async fn mark_dispatched(&self, event: &RecordedEvent<Self::Payload>) -> StorageResult<()>;

    /// Issues a fresh unique identifier.
    async fn fresh_id(&self) -> StorageResult<Uuid>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_open_range_contains_everything_from_its_start() {
        let range = RevisionRange::starting_at(StreamRevision::new(3));
        assert!(!range.contains(StreamRevision::new(2)));
        assert!(range.contains(StreamRevision::new(3)));
        assert!(range.contains(StreamRevision::new(1_000_000)));
    }

    #[test]
    fn a_bounded_range_excludes_its_upper_end() {
        let range = RevisionRange::new(StreamRevision::new(1), Some(StreamRevision::new(4)));
        assert!(!range.contains(StreamRevision::new(0)));
        assert!(range.contains(StreamRevision::new(1)));
        assert!(range.contains(StreamRevision::new(3)));
        assert!(!range.contains(StreamRevision::new(4)));
    }

    #[test]
    fn the_all_range_starts_at_revision_zero() {
        let range = RevisionRange::all();
        assert!(range.contains(StreamRevision::initial()));
        assert_eq!(range.to(), None);
    }
}
