//! Error types for the event store.
//!
//! Every fallible operation signals success or a typed error through its
//! return value; errors are never used for control flow. Backend failures
//! pass through the coordinator unchanged, and publish failures stay inside
//! the dispatcher, which retries on its next tick.

use crate::types::{StreamId, StreamRevision};
use thiserror::Error;

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend failed while performing an operation.
    #[error("storage backend failed during {operation}: {detail}")]
    Backend {
        /// Which storage operation was in flight.
        operation: &'static str,
        /// Backend-specific failure description.
        detail: String,
    },

    /// An event batch contained events for more than one stream.
    #[error("event batch mixes streams: expected '{expected}', found '{found}'")]
    MixedStreamBatch {
        /// Stream id of the first event in the batch.
        expected: StreamId,
        /// The conflicting stream id encountered later in the batch.
        found: StreamId,
    },

    /// An appended batch does not extend the stream's current tail.
    ///
    /// Raised when two commits race on the same stream from stale loads;
    /// commit serialization per stream is the caller's responsibility, this
    /// check only prevents silently interleaved revisions.
    #[error("append does not extend stream '{stream}': expected revision {expected}, got {got}")]
    RevisionConflict {
        /// The stream being appended to.
        stream: StreamId,
        /// The revision the backend expected next.
        expected: StreamRevision,
        /// The revision the batch actually started at.
        got: StreamRevision,
    },

    /// An event to be marked dispatched was not found in the backend.
    #[error("unknown event for stream '{stream}' at revision {revision}")]
    UnknownEvent {
        /// The stream the event claimed to belong to.
        stream: StreamId,
        /// The revision the event claimed to hold.
        revision: StreamRevision,
    },

    /// An I/O failure in a persistent backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by the store coordinator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A storage operation failed; the backend error is passed through.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors returned by a publisher when it rejects an event.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The downstream sink rejected the event.
    #[error("publisher rejected event: {0}")]
    Rejected(String),

    /// The downstream sink could not be reached.
    #[error("publisher unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result alias for store coordinator operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result alias for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;
