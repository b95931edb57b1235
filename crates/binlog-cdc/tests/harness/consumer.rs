//! Recording stream consumer

use async_trait::async_trait;
use binlog_cdc::common::{CdcError, ChangeEvent, Result, StreamConsumer, StreamPosition};
use std::sync::Mutex;
use std::time::Duration;

/// One consumer callback, in the order it was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Started,
    /// Batch of this many events
    Accept(usize),
    Ended,
}

/// Captures every batch handed to it, plus the order of all callbacks.
#[derive(Default)]
pub struct RecordingConsumer {
    calls: Mutex<Vec<Call>>,
    batches: Mutex<Vec<(Vec<ChangeEvent>, StreamPosition)>>,
    /// Reject the batch with this index
    fail_at: Option<usize>,
    /// Sleep before recording each batch
    accept_delay: Option<Duration>,
}

impl RecordingConsumer {
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Default::default()
        }
    }

    pub fn with_accept_delay(delay: Duration) -> Self {
        Self {
            accept_delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, call: Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|&&c| c == call).count()
    }

    pub fn started(&self) -> usize {
        self.count(Call::Started)
    }

    pub fn ended(&self) -> usize {
        self.count(Call::Ended)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .map(|(events, _)| events.len())
            .collect()
    }

    /// Every delivered event with the position it was delivered with.
    pub fn delivered(&self) -> Vec<(ChangeEvent, StreamPosition)> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(events, position)| {
                events
                    .iter()
                    .map(move |event| (event.clone(), position.clone()))
            })
            .collect()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.delivered().into_iter().map(|(event, _)| event).collect()
    }

    pub fn len(&self) -> usize {
        self.delivered().len()
    }

    /// Panics unless the log is one start, then batches only, then one end.
    pub fn assert_well_ordered(&self) {
        let calls = self.calls();
        assert_eq!(calls.first(), Some(&Call::Started), "calls: {:?}", calls);
        assert_eq!(calls.last(), Some(&Call::Ended), "calls: {:?}", calls);
        assert!(
            calls[1..calls.len() - 1]
                .iter()
                .all(|c| matches!(c, Call::Accept(_))),
            "calls: {:?}",
            calls
        );
    }
}

#[async_trait]
impl StreamConsumer for RecordingConsumer {
    async fn stream_read_started(&self) {
        self.calls.lock().unwrap().push(Call::Started);
    }

    async fn accept(&self, events: Vec<ChangeEvent>, position: StreamPosition) -> Result<()> {
        if let Some(delay) = self.accept_delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push(Call::Accept(events.len()));

        let mut batches = self.batches.lock().unwrap();
        if self.fail_at == Some(batches.len()) {
            return Err(CdcError::other("downstream rejected batch"));
        }
        batches.push((events, position));
        Ok(())
    }

    async fn stream_read_ended(&self) {
        self.calls.lock().unwrap().push(Call::Ended);
    }
}
