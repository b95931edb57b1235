//! Delivery loop
//!
//! Drains the event queue into the consumer, one event per batch, in queue
//! order. Runs until the session stops or every producer has gone away and
//! the queue is empty.

use crate::common::{Dequeued, EventConsumer, Result, StreamConsumer};
use tracing::{debug, trace};

/// Deliver queued events to `consumer`. Returns the number delivered.
///
/// An error from the consumer ends the loop and is returned as is.
pub async fn run_delivery_loop(
    mut queue: EventConsumer,
    consumer: &dyn StreamConsumer,
) -> Result<u64> {
    let mut delivered = 0u64;

    while queue.is_running() {
        match queue.dequeue().await {
            Dequeued::Item(item) => {
                if !queue.is_running() {
                    debug!("Session stopped, discarding dequeued event");
                    break;
                }
                consumer.accept(vec![item.event], item.position).await?;
                delivered += 1;
            }
            Dequeued::Empty => trace!("No event within poll timeout"),
            Dequeued::Closed => {
                debug!("Event queue closed and drained");
                break;
            }
        }
    }

    debug!("Delivery loop finished after {} events", delivered);
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{
        event_queue, BinlogPosition, ChangeEvent, QueueConfig, Row, StreamEvent, StreamPosition,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct Recorder {
        batches: Mutex<Vec<(Vec<ChangeEvent>, StreamPosition)>>,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl StreamConsumer for Recorder {
        async fn stream_read_started(&self) {}

        async fn accept(&self, events: Vec<ChangeEvent>, position: StreamPosition) -> Result<()> {
            let mut batches = self.batches.lock().unwrap();
            if self.fail_at == Some(batches.len()) {
                return Err(crate::common::CdcError::other("sink unavailable"));
            }
            batches.push((events, position));
            Ok(())
        }

        async fn stream_read_ended(&self) {}
    }

    fn item(n: u64) -> StreamEvent {
        StreamEvent::new(
            ChangeEvent::insert("t", Row::new(), n as i64),
            BinlogPosition::new("bin.1", n).to_stream_position("s", 1).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_delivers_in_order_as_single_event_batches() {
        let token = CancellationToken::new();
        let (producer, queue) = event_queue(&QueueConfig::default(), token);
        let recorder = Recorder::default();

        let feeder = tokio::spawn(async move {
            for n in 0..25 {
                assert!(producer.enqueue(item(n)).await);
            }
        });

        let delivered = run_delivery_loop(queue, &recorder).await.unwrap();
        feeder.await.unwrap();

        assert_eq!(delivered, 25);
        let batches = recorder.batches.lock().unwrap();
        for (n, (events, position)) in batches.iter().enumerate() {
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].reference_time(), n as i64);
            assert_eq!(position.binlog_position().unwrap().position, n as u64);
        }
    }

    #[tokio::test]
    async fn test_stops_when_cancelled() {
        let token = CancellationToken::new();
        let (producer, queue) = event_queue(&QueueConfig::default(), token.clone());
        producer.enqueue(item(0)).await;
        token.cancel();

        let recorder = Recorder::default();
        let delivered = run_delivery_loop(queue, &recorder).await.unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_consumer_error_ends_loop() {
        let token = CancellationToken::new();
        let (producer, queue) = event_queue(&QueueConfig::default(), token);
        for n in 0..3 {
            producer.enqueue(item(n)).await;
        }
        drop(producer);

        let recorder = Recorder {
            fail_at: Some(1),
            ..Default::default()
        };
        assert!(run_delivery_loop(queue, &recorder).await.is_err());
        assert_eq!(recorder.batches.lock().unwrap().len(), 1);
    }
}
