//! Collaborator seams
//!
//! The reader drives an opaque tailing engine and feeds a downstream
//! consumer. Both sit behind traits so that any log tailer (or a scripted
//! one in tests) and any sink can be plugged in.

use crate::common::{CdcError, ChangeEvent, EngineConfig, Result, SourceRecord, StreamPosition};
use async_trait::async_trait;
use std::sync::Arc;

/// Downstream receiver of translated events.
#[async_trait]
pub trait StreamConsumer: Send + Sync {
    /// Called once when the engine has started reading.
    async fn stream_read_started(&self);

    /// Deliver a batch of events. `position` resumes right after the last one.
    ///
    /// An error here is fatal for the stream.
    async fn accept(&self, events: Vec<ChangeEvent>, position: StreamPosition) -> Result<()>;

    /// Called exactly once after the last `accept`, whatever the reason the stream stopped.
    async fn stream_read_ended(&self);
}

/// How an engine run ended.
#[derive(Debug)]
pub enum EngineOutcome {
    Completed {
        message: String,
    },
    Failed {
        message: String,
        cause: Option<CdcError>,
    },
}

impl EngineOutcome {
    pub fn completed(message: impl Into<String>) -> Self {
        EngineOutcome::Completed {
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>, cause: Option<CdcError>) -> Self {
        EngineOutcome::Failed {
            message: message.into(),
            cause,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EngineOutcome::Completed { .. })
    }
}

/// Callbacks an engine invokes during a run.
#[async_trait]
pub trait EngineHandler: Send + Sync {
    async fn on_started(&self);

    /// Handle one raw record. On error the engine should stop reading; the
    /// handler has already recorded the failure.
    async fn on_record(&self, record: SourceRecord) -> Result<()>;

    async fn on_stopped(&self, outcome: EngineOutcome);
}

/// Opaque log tailer.
#[async_trait]
pub trait TailingEngine: Send + Sync {
    /// Run until the log ends, the engine fails, or [`close`](Self::close)
    /// is called. Lifecycle and records are reported through `handler`;
    /// `on_stopped` must be called before returning.
    async fn run(&self, config: EngineConfig, handler: Arc<dyn EngineHandler>);

    /// Ask a running engine to stop. Must be idempotent.
    async fn close(&self) -> Result<()>;
}
