//! Event and snapshot records.
//!
//! An event exists in one of two shapes. A [`PendingEvent`] is created when a
//! caller appends a payload to an [`EventStream`](crate::EventStream); it has
//! no identity yet. At commit time the coordinator seals each pending event
//! into a [`RecordedEvent`], assigning its stream revision and the commit
//! batch identity in one step. Splitting the two shapes keeps half-built
//! records unrepresentable: a `RecordedEvent` always carries a complete
//! identity.

use crate::types::{CommitId, SnapshotId, StreamId, StreamRevision, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event appended to a stream but not yet committed.
///
/// Carries only what the caller supplies: the opaque payload and an optional
/// opaque header. Identity fields do not exist until commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEvent<P> {
    /// Optional opaque metadata attached by the caller.
    pub header: Option<Value>,
    /// The opaque domain payload.
    pub payload: P,
}

impl<P> PendingEvent<P> {
    /// Wraps a payload with no header.
    pub const fn new(payload: P) -> Self {
        Self {
            header: None,
            payload,
        }
    }

    /// Wraps a payload together with an opaque header.
    pub const fn with_header(payload: P, header: Value) -> Self {
        Self {
            header: Some(header),
            payload,
        }
    }

    /// Seals this pending event with its commit identity.
    ///
    /// Called once per event during the commit protocol; `commit_sequence` is
    /// the event's 0-based position within the batch and `stream_revision`
    /// its position within the stream.
    pub(crate) fn seal(
        self,
        stream_id: StreamId,
        stream_revision: StreamRevision,
        commit_id: CommitId,
        commit_sequence: u32,
        commit_stamp: Timestamp,
    ) -> RecordedEvent<P> {
        RecordedEvent {
            stream_id,
            stream_revision,
            commit_id,
            commit_sequence,
            commit_stamp,
            header: self.header,
            dispatched: false,
            payload: self.payload,
        }
    }
}

/// A committed event as persisted by a storage backend.
///
/// Within one stream, recorded events are totally ordered by
/// `stream_revision`. All events of one commit batch share `commit_id` and
/// `commit_stamp`, and their `commit_sequence` values run densely from 0 in
/// batch order. `dispatched` starts false and flips to true exactly once the
/// dispatcher has handed the event to the publisher successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent<P> {
    /// The stream this event belongs to.
    pub stream_id: StreamId,
    /// Position of this event within its stream.
    pub stream_revision: StreamRevision,
    /// Identity shared by all events of the same commit.
    pub commit_id: CommitId,
    /// 0-based position of this event within its commit batch.
    pub commit_sequence: u32,
    /// Wall-clock time of the commit, shared by the whole batch.
    pub commit_stamp: Timestamp,
    /// Optional opaque metadata attached by the caller.
    pub header: Option<Value>,
    /// Whether the dispatcher has successfully published this event.
    pub dispatched: bool,
    /// The opaque domain payload.
    pub payload: P,
}

/// A captured aggregate state at a specific stream revision.
///
/// `revision` is the stream revision the snapshot covers, inclusive: loading
/// from the snapshot replays only events after it. The data is opaque to the
/// store and never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Backend-issued identity of this snapshot.
    pub id: SnapshotId,
    /// The stream this snapshot belongs to.
    pub stream_id: StreamId,
    /// The stream revision captured by this snapshot, inclusive.
    pub revision: StreamRevision,
    /// The opaque captured state.
    pub data: Value,
}

impl Snapshot {
    /// Assembles a snapshot record.
    pub const fn new(id: SnapshotId, stream_id: StreamId, revision: StreamRevision, data: Value) -> Self {
        Self {
            id,
            stream_id,
            revision,
            data,
        }
    }
}
