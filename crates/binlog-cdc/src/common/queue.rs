//! Bounded event queue between the engine and the delivery task
//!
//! Producers block while the queue is full, waking every `poll_timeout` to
//! re-check the running token; once stopped, the pending item is dropped.
//! The consumer side waits at most `poll_timeout` per dequeue so the
//! delivery loop can observe shutdown.

use crate::common::StreamEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum number of queued events
    pub capacity: usize,
    /// Wait bound for one enqueue or dequeue attempt
    pub poll_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl QueueConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }
}

/// Create a queue bound to `running`.
pub fn event_queue(config: &QueueConfig, running: CancellationToken) -> (EventProducer, EventConsumer) {
    let (tx, rx) = mpsc::channel(config.capacity.max(1));
    (
        EventProducer {
            tx,
            running: running.clone(),
            poll_timeout: config.poll_timeout,
        },
        EventConsumer {
            rx,
            running,
            poll_timeout: config.poll_timeout,
        },
    )
}

/// Sending half. Cloning shares the same queue; the queue closes when every
/// producer is dropped.
#[derive(Debug, Clone)]
pub struct EventProducer {
    tx: mpsc::Sender<StreamEvent>,
    running: CancellationToken,
    poll_timeout: Duration,
}

impl EventProducer {
    /// Enqueue `item`, waiting for space until it fits or the session stops.
    ///
    /// Returns false if the item was dropped.
    pub async fn enqueue(&self, item: StreamEvent) -> bool {
        loop {
            if self.running.is_cancelled() {
                debug!("Session stopped, dropping event for {}", item.event.table());
                return false;
            }

            let permit = tokio::select! {
                biased;
                _ = self.running.cancelled() => continue,
                permit = tokio::time::timeout(self.poll_timeout, self.tx.reserve()) => permit,
            };

            match permit {
                Ok(Ok(permit)) => {
                    permit.send(item);
                    return true;
                }
                Ok(Err(_)) => {
                    debug!("Event queue closed, dropping event");
                    return false;
                }
                Err(_) => trace!("Event queue full, retrying"),
            }
        }
    }

    /// Number of events currently queued.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of one dequeue attempt.
#[derive(Debug)]
pub enum Dequeued {
    Item(StreamEvent),
    /// Nothing arrived within the poll timeout, or the session stopped
    Empty,
    /// All producers are gone and the queue is drained
    Closed,
}

/// Receiving half, owned by the delivery task.
#[derive(Debug)]
pub struct EventConsumer {
    rx: mpsc::Receiver<StreamEvent>,
    running: CancellationToken,
    poll_timeout: Duration,
}

impl EventConsumer {
    pub async fn dequeue(&mut self) -> Dequeued {
        tokio::select! {
            biased;
            _ = self.running.cancelled() => Dequeued::Empty,
            received = tokio::time::timeout(self.poll_timeout, self.rx.recv()) => match received {
                Ok(Some(item)) => Dequeued::Item(item),
                Ok(None) => Dequeued::Closed,
                Err(_) => Dequeued::Empty,
            },
        }
    }

    pub fn is_running(&self) -> bool {
        !self.running.is_cancelled()
    }
}
