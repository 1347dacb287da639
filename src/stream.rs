//! The per-aggregate working set of committed and pending events.

use crate::event::{PendingEvent, RecordedEvent};
use crate::types::{StreamId, StreamRevision};
use serde_json::Value;

/// A mutable, single-caller view over one stream.
///
/// Loading a stream from the store produces a fresh `EventStream` holding the
/// committed events of the requested range. The caller appends new payloads
/// with [`add_event`](Self::add_event) and hands the whole stream to
/// [`EventStore::commit`](crate::EventStore::commit), which seals the pending
/// events and moves them into the committed list.
///
/// An `EventStream` is not shared between callers and is not thread-safe;
/// the caller holds exclusive access for the load, mutate, commit cycle.
#[derive(Debug, Clone)]
pub struct EventStream<P> {
    stream_id: StreamId,
    events: Vec<RecordedEvent<P>>,
    uncommitted_events: Vec<PendingEvent<P>>,
}

impl<P> EventStream<P> {
    /// Creates an empty stream view with no committed history.
    pub fn new(stream_id: StreamId) -> Self {
        Self {
            stream_id,
            events: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Creates a stream view over already-committed events.
    pub fn hydrated(stream_id: StreamId, events: Vec<RecordedEvent<P>>) -> Self {
        Self {
            stream_id,
            events,
            uncommitted_events: Vec::new(),
        }
    }

    /// The stream this view is bound to.
    pub const fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    /// The committed events loaded into this view, in revision order.
    pub fn events(&self) -> &[RecordedEvent<P>] {
        &self.events
    }

    /// Events appended to this view but not yet committed, in append order.
    pub fn uncommitted_events(&self) -> &[PendingEvent<P>] {
        &self.uncommitted_events
    }

    /// The highest committed revision seen by this view, or `None` if the
    /// view holds no committed events.
    pub fn current_revision(&self) -> Option<StreamRevision> {
        self.events.iter().map(|event| event.stream_revision).max()
    }

    /// Appends a payload as a pending event.
    ///
    /// Append order is commit order: the first payload added receives the
    /// lowest revision and commit sequence of the batch.
    pub fn add_event(&mut self, payload: P) {
        self.uncommitted_events.push(PendingEvent::new(payload));
    }

    /// Appends a payload with an opaque header attached.
    pub fn add_event_with_header(&mut self, payload: P, header: Value) {
        self.uncommitted_events
            .push(PendingEvent::with_header(payload, header));
    }

    /// Replaces the pending list with the sealed batch after persistence.
    ///
    /// Only called by the commit protocol once the storage append succeeded;
    /// on a failed commit the pending events stay untouched so the caller can
    /// retry.
    pub(crate) fn finish_commit(&mut self, recorded: Vec<RecordedEvent<P>>) {
        self.uncommitted_events.clear();
        self.events.extend(recorded);
    }
}
