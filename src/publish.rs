//! The downstream publisher contract.

use crate::errors::PublishResult;
use crate::event::RecordedEvent;
use async_trait::async_trait;
use std::marker::PhantomData;

/// A sink that accepts committed events from the dispatcher.
///
/// The dispatcher retries a rejected event on its next tick and republishes
/// after a crash-restart, so delivery is at-least-once: publishers must be
/// idempotent per `(commit_id, commit_sequence)` or tolerate duplicates.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// The opaque event payload type this publisher accepts.
    type Payload: Send + Sync;

    /// Delivers one committed event downstream.
    async fn publish(&self, event: &RecordedEvent<Self::Payload>) -> PublishResult<()>;
}

/// A publisher that accepts and discards every event.
///
/// Bound by the store builder when no publisher role is configured.
pub struct NoopPublisher<P> {
    _payload: PhantomData<fn() -> P>,
}

impl<P> NoopPublisher<P> {
    /// Creates a no-op publisher.
    pub const fn new() -> Self {
        Self {
            _payload: PhantomData,
        }
    }
}

impl<P> Default for NoopPublisher<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P> Publisher for NoopPublisher<P>
where
    P: Send + Sync,
{
    type Payload = P;

    async fn publish(&self, _event: &RecordedEvent<P>) -> PublishResult<()> {
        Ok(())
    }
}
