//! Background dispatch of committed events.
//!
//! The dispatcher drives every committed event to the publisher exactly once
//! per successful publish, surviving process restarts through the persisted
//! `dispatched = false` markers. It runs as a single cooperative tokio task:
//! commits hand event batches over an unbounded channel, the worker drains
//! arrivals into a FIFO backlog on every tick and publishes from the front.
//!
//! Delivery order is enqueue order: commit order within a batch, completion
//! order across commits. A failed publish leaves the event at the head of
//! the backlog and ends the tick, so order is preserved across retries.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::errors::StorageResult;
use crate::event::RecordedEvent;
use crate::logging::Logger;
use crate::publish::Publisher;
use crate::storage::Storage;

/// Handle to the running dispatch task.
///
/// Created by [`Dispatcher::start`], which performs recovery before the
/// worker accepts any enqueue: events persisted as undispatched by an
/// earlier process seed the backlog and are republished first.
pub struct Dispatcher<P> {
    queue_tx: mpsc::UnboundedSender<RecordedEvent<P>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl<P> Dispatcher<P>
where
    P: Clone + Send + Sync + 'static,
{
    /// Recovers the undispatched backlog from storage and spawns the worker.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the recovery scan fails; the worker is
    /// not spawned in that case.
    pub async fn start(
        storage: Arc<dyn Storage<Payload = P>>,
        publisher: Arc<dyn Publisher<Payload = P>>,
        logger: Arc<dyn Logger>,
        publishing_interval: Duration,
    ) -> StorageResult<Self> {
        let backlog: VecDeque<RecordedEvent<P>> =
            storage.undispatched_events().await?.into_iter().collect();
        if !backlog.is_empty() {
            logger.info(&format!(
                "dispatcher recovered {} undispatched event(s)",
                backlog.len()
            ));
        }

        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let worker = Worker {
            storage,
            publisher,
            logger,
            backlog,
            queue_rx,
            publishing_interval,
        };
        let handle = tokio::spawn(worker.run(shutdown_rx));

        Ok(Self {
            queue_tx,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Enqueues a freshly committed batch for publishing.
    ///
    /// Best-effort: if the worker has already stopped, the events stay
    /// persisted as undispatched and are recovered on the next start.
    pub fn add_undispatched_events(&self, batch: Vec<RecordedEvent<P>>) {
        for event in batch {
            if self.queue_tx.send(event).is_err() {
                break;
            }
        }
    }

    /// Requests the worker to exit after its current tick and waits for it.
    ///
    /// An in-flight publish finishes; everything still queued remains
    /// `dispatched = false` in storage and is picked up on the next start.
    pub async fn stop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

struct Worker<P> {
    storage: Arc<dyn Storage<Payload = P>>,
    publisher: Arc<dyn Publisher<Payload = P>>,
    logger: Arc<dyn Logger>,
    backlog: VecDeque<RecordedEvent<P>>,
    queue_rx: mpsc::UnboundedReceiver<RecordedEvent<P>>,
    publishing_interval: Duration,
}

impl<P> Worker<P>
where
    P: Clone + Send + Sync + 'static,
{
    async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) {
        let mut ticker = interval(self.publishing_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => self.drain_tick().await,
            }
        }

        self.logger.debug("dispatcher stopped");
    }

    /// Publishes the backlog front-to-back until it is empty or a publish
    /// fails; a failure keeps the event at the head for the next tick.
    async fn drain_tick(&mut self) {
        while let Ok(event) = self.queue_rx.try_recv() {
            self.backlog.push_back(event);
        }

        while let Some(event) = self.backlog.front() {
            match self.publisher.publish(event).await {
                Ok(()) => {
                    if let Err(err) = self.storage.mark_dispatched(event).await {
                        // The durable marker still says undispatched, so the
                        // event will be republished after the next recovery;
                        // dropping it from the in-memory queue avoids a tight
                        // republish loop within this process.
                        self.logger.error(&format!(
                            "failed to mark event dispatched for stream '{}' at revision {}: {err}",
                            event.stream_id, event.stream_revision
                        ));
                    }
                    self.backlog.pop_front();
                }
                Err(err) => {
                    self.logger.warn(&format!(
                        "publish failed for stream '{}' at revision {}: {err}; retrying next tick",
                        event.stream_id, event.stream_revision
                    ));
                    break;
                }
            }
        }
    }
}
