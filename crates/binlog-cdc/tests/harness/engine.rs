//! Scripted tailing engine

use async_trait::async_trait;
use binlog_cdc::common::{
    EngineConfig, EngineHandler, EngineOutcome, Result, SourceRecord, TailingEngine,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// One step of an engine run.
#[derive(Debug, Clone)]
pub enum Step {
    /// Hand a record to the handler
    Record(SourceRecord),
    /// Block until the engine is closed
    WaitForClose,
    /// End the run with a failure
    Fail(String),
}

/// Engine that replays a fixed script, then completes.
#[derive(Default)]
pub struct ScriptedEngine {
    steps: Mutex<Vec<Step>>,
    configs: Mutex<Vec<EngineConfig>>,
    closed: CancellationToken,
    close_calls: AtomicUsize,
    runs: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps),
            ..Default::default()
        })
    }

    pub fn records(records: Vec<SourceRecord>) -> Arc<Self> {
        Self::new(records.into_iter().map(Step::Record).collect())
    }

    /// Configuration of the most recent run.
    pub fn last_config(&self) -> Option<EngineConfig> {
        self.configs.lock().unwrap().last().cloned()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TailingEngine for ScriptedEngine {
    async fn run(&self, config: EngineConfig, handler: Arc<dyn EngineHandler>) {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.configs.lock().unwrap().push(config);
        let steps = std::mem::take(&mut *self.steps.lock().unwrap());

        handler.on_started().await;
        for step in steps {
            if self.closed.is_cancelled() {
                break;
            }
            match step {
                Step::Record(record) => {
                    if let Err(e) = handler.on_record(record).await {
                        handler
                            .on_stopped(EngineOutcome::failed("Record handling failed", Some(e)))
                            .await;
                        return;
                    }
                }
                Step::WaitForClose => self.closed.cancelled().await,
                Step::Fail(message) => {
                    handler.on_stopped(EngineOutcome::failed(message, None)).await;
                    return;
                }
            }
        }

        let message = if self.closed.is_cancelled() {
            "closed"
        } else {
            ""
        };
        handler.on_stopped(EngineOutcome::completed(message)).await;
    }

    async fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.cancel();
        Ok(())
    }
}
