//! # eventvault
//!
//! An append-only event store for domain events organized into per-aggregate
//! streams, with snapshot support and a reliable background dispatch
//! pipeline that publishes committed events once their persistence has been
//! durably acknowledged.
//!
//! ## Core pieces
//!
//! - **[`EventStore`]** coordinates the commit protocol: it seals each
//!   pending batch with a shared commit identity and gap-free per-stream
//!   revisions, persists it through the storage backend in a single append,
//!   and enqueues it for dispatch.
//! - **[`EventStream`]** is the per-aggregate working set: the committed
//!   events a caller loaded plus the payloads appended since.
//! - **[`Storage`]** is the swappable persistence port;
//!   [`InMemoryStorage`] is the bundled reference backend.
//! - The **dispatcher** runs as a background task, draining committed
//!   events to the bound [`Publisher`] and flipping their durable
//!   `dispatched` markers, so a commit followed by a crash is republished on
//!   the next start.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use eventvault::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
//! enum AccountEvent {
//!     Opened { owner: String },
//!     Deposited { amount: u64 },
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store: EventStore<AccountEvent> = EventStore::builder()
//!         .console_logger()
//!         .build()
//!         .await?;
//!
//!     let stream_id = StreamId::try_new("account-42")?;
//!     let mut stream = store.stream(stream_id.clone(), RevisionRange::all()).await?;
//!     stream.add_event(AccountEvent::Opened { owner: "ada".into() });
//!     stream.add_event(AccountEvent::Deposited { amount: 100 });
//!     store.commit(&mut stream).await?;
//!
//!     // Later: shortcut replay through a snapshot.
//!     let (snapshot, tail) = store.stream_from_snapshot(stream_id, None).await?;
//!     println!("replaying {} event(s) after snapshot {snapshot:?}", tail.events().len());
//!     Ok(())
//! }
//! ```
//!
//! ## Delivery contract
//!
//! Dispatch is at-least-once: if the process crashes between a successful
//! publish and the durable dispatched marker, the event is published again
//! after the next start. Publishers must be idempotent per
//! `(commit_id, commit_sequence)` or tolerate duplicates.
//!
//! Commit serialization per stream is the caller's responsibility. Two
//! working sets loaded concurrently for the same stream race at commit; the
//! backend's tail check refuses the stale one instead of interleaving
//! revisions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dispatch;
mod errors;
mod event;
mod logging;
mod memory;
mod publish;
mod storage;
mod store;
mod stream;
mod types;

pub use dispatch::Dispatcher;
pub use errors::{
    PublishError, PublishResult, StorageError, StorageResult, StoreError, StoreResult,
};
pub use event::{PendingEvent, RecordedEvent, Snapshot};
pub use logging::{ConsoleLogger, Logger, TracingLogger};
pub use memory::InMemoryStorage;
pub use publish::{NoopPublisher, Publisher};
pub use storage::{RevisionRange, Storage};
pub use store::{EventStore, EventStoreBuilder, StoreOptions};
pub use stream::EventStream;
pub use types::{
    CommitId, SnapshotId, StreamId, StreamIdError, StreamRevision, Timestamp,
};

/// Commonly used imports.
///
/// ```rust
/// use eventvault::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CommitId, EventStore, EventStoreBuilder, EventStream, InMemoryStorage, Logger,
        PendingEvent, Publisher, RecordedEvent, RevisionRange, Snapshot, SnapshotId, Storage,
        StorageError, StoreError, StreamId, StreamRevision, Timestamp,
    };
}
