//! Core domain types for the event store.
//!
//! All identifier types follow the "parse, don't validate" principle: once a
//! value is constructed it is guaranteed valid for the lifetime of the
//! program. `StreamId` carries its validation in the type; `CommitId` and
//! `SnapshotId` wrap backend-issued UUIDs; `StreamRevision` is the per-stream
//! position counter; `Timestamp` pins all wall-clock values to UTC.

use chrono::{DateTime, Utc};
use nutype::nutype;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an event stream (one aggregate's ordered event log).
///
/// Guaranteed non-empty after trimming and at most 255 characters.
///
/// # Examples
///
/// ```
/// use eventvault::StreamId;
///
/// let id = StreamId::try_new("order-42").expect("valid stream id");
/// assert_eq!(id.as_ref(), "order-42");
///
/// assert!(StreamId::try_new("").is_err());
/// assert!(StreamId::try_new("   ").is_err());
/// ```
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct StreamId(String);

/// The position of an event within its stream.
///
/// The first committed event of a stream has revision 0; every later event
/// has the revision of its predecessor plus one, with no gaps. An empty
/// stream has no revision at all, which callers express as
/// `Option<StreamRevision>`.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Into,
    Serialize,
    Deserialize
))]
pub struct StreamRevision(u64);

impl StreamRevision {
    /// Revision of the first event in any stream.
    pub fn initial() -> Self {
        Self::new(0)
    }

    /// The revision immediately following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self::new(self.into_inner() + 1)
    }
}

/// Identity shared by every event persisted in one commit batch.
///
/// Commit ids are issued by the storage backend (`Storage::fresh_id`); the
/// reference backend hands out UUIDv7 values so ids sort chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(Uuid);

impl CommitId {
    /// Wraps a backend-issued id.
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a persisted snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(Uuid);

impl SnapshotId {
    /// Wraps a backend-issued id.
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A UTC wall-clock timestamp.
///
/// Commit stamps are taken once per commit batch, so every event of a batch
/// carries the same `Timestamp`. Storing UTC only avoids timezone ambiguity
/// when the global log is sorted by stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wraps an existing UTC datetime.
    pub const fn new(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// The current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Borrow the underlying datetime.
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::new(datetime)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn stream_id_accepts_reasonable_strings(s in "[a-zA-Z0-9_-]{1,255}") {
            let id = StreamId::try_new(s.clone());
            prop_assert!(id.is_ok());
            let id = id.unwrap();
            prop_assert_eq!(id.as_ref(), &s);
        }

        #[test]
        fn stream_id_trims_surrounding_whitespace(s in " {0,8}[a-zA-Z0-9_-]{1,200} {0,8}") {
            let id = StreamId::try_new(s.clone()).unwrap();
            prop_assert_eq!(id.as_ref(), s.trim());
        }

        #[test]
        fn stream_id_rejects_blank_input(s in " {0,40}") {
            prop_assert!(StreamId::try_new(s).is_err());
        }

        #[test]
        fn stream_revision_next_is_strictly_increasing(n in 0u64..1_000_000) {
            let rev = StreamRevision::new(n);
            prop_assert!(rev.next() > rev);
            prop_assert_eq!(u64::from(rev.next()), n + 1);
        }
    }

    #[test]
    fn stream_id_rejects_overlong_input() {
        assert!(StreamId::try_new("a".repeat(256)).is_err());
        assert!(StreamId::try_new("a".repeat(255)).is_ok());
    }

    #[test]
    fn initial_revision_is_zero() {
        assert_eq!(u64::from(StreamRevision::initial()), 0);
        assert_eq!(StreamRevision::initial().next(), StreamRevision::new(1));
    }

    #[test]
    fn commit_ids_round_trip_through_serde() {
        let id = CommitId::new(Uuid::now_v7());
        let json = serde_json::to_string(&id).unwrap();
        let back: CommitId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn timestamps_order_chronologically() {
        let earlier = Timestamp::now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let later = Timestamp::now();
        assert!(later > earlier);
    }
}
