//! Stream session
//!
//! One session is one engine run. [`StreamSession::start`] wires the engine
//! to the translator and the event queue, spawns the delivery task and the
//! schema history timer, runs the engine on the calling task, and tears
//! everything down before returning.
//!
//! Shutdown paths all converge on the session's cancellation token:
//!
//! - [`StreamSession::stop`] cancels it directly;
//! - a fatal translation or delivery error records itself as the session
//!   failure, then cancels it;
//! - a natural engine completion first lets the delivery task drain the
//!   queue, then cancels it.
//!
//! A watcher task closes the engine as soon as the token is cancelled.

use crate::common::{
    event_queue, run_delivery_loop, run_persistence_timer, CdcError, DdlTranslator,
    EngineHandler, EngineOutcome, EventProducer, RecordTranslator, Result, SchemaHistoryCache,
    SessionIdentity, SharedStateStore, SourceRecord, StartPosition, StreamConsumer, TableCatalog,
    TailingEngine,
};
use crate::mariadb::config::{effective_batch_size, ReaderConfig};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// First failure of a session; later ones are logged and dropped.
#[derive(Debug, Default)]
struct FailureSlot {
    slot: Mutex<Option<CdcError>>,
}

impl FailureSlot {
    fn record(&self, err: CdcError) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(err);
        } else {
            debug!("Ignoring subsequent failure: {}", err);
        }
    }

    fn is_set(&self) -> bool {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    fn take(&self) -> Option<CdcError> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Engine callbacks for one session.
struct SessionHandler {
    translator: RecordTranslator,
    producer: Mutex<Option<EventProducer>>,
    consumer: Arc<dyn StreamConsumer>,
    failure: Arc<FailureSlot>,
    running: CancellationToken,
}

impl SessionHandler {
    fn producer(&self) -> Option<EventProducer> {
        self.producer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Drop the handler's producer so the queue closes once drained.
    fn close_queue(&self) {
        self.producer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
    }

    fn fail(&self, err: CdcError) -> String {
        let message = err.to_string();
        self.failure.record(err);
        self.running.cancel();
        message
    }
}

#[async_trait]
impl EngineHandler for SessionHandler {
    async fn on_started(&self) {
        info!("CDC engine started, server name: {}", self.translator.session_name());
        self.consumer.stream_read_started().await;
    }

    async fn on_record(&self, record: SourceRecord) -> Result<()> {
        if self.running.is_cancelled() {
            return Ok(());
        }

        let events = match self.translator.translate(record) {
            Ok(events) => events,
            Err(e) => {
                error!("Failed to translate record: {}", e);
                return Err(CdcError::engine(self.fail(e)));
            }
        };

        let Some(producer) = self.producer() else {
            return Ok(());
        };
        for event in events {
            if !producer.enqueue(event).await {
                break;
            }
        }
        Ok(())
    }

    async fn on_stopped(&self, outcome: EngineOutcome) {
        match outcome {
            EngineOutcome::Completed { message } if message.is_empty() => {
                info!("CDC engine stopped")
            }
            EngineOutcome::Completed { message } => info!("CDC engine stopped: {}", message),
            EngineOutcome::Failed { message, cause } => {
                let err = match cause {
                    Some(cause) if message.is_empty() => CdcError::engine(cause.to_string()),
                    Some(cause) => CdcError::engine(format!("{}: {}", message, cause)),
                    None => CdcError::engine(message),
                };
                error!("CDC engine failed: {}", err);
                self.fail(err);
            }
        }
    }
}

/// One run of the binlog reader.
pub struct StreamSession {
    config: ReaderConfig,
    engine: Arc<dyn TailingEngine>,
    state: SharedStateStore,
    catalog: Arc<dyn TableCatalog>,
    history: Arc<SchemaHistoryCache>,
    ddl_translator: Arc<dyn DdlTranslator>,
    running: CancellationToken,
    started: AtomicBool,
}

impl StreamSession {
    pub fn new(
        config: ReaderConfig,
        engine: Arc<dyn TailingEngine>,
        state: SharedStateStore,
        catalog: Arc<dyn TableCatalog>,
        history: Arc<SchemaHistoryCache>,
    ) -> Self {
        let ddl_translator = config.ddl_dialect.translator();
        Self {
            config,
            engine,
            state,
            catalog,
            history,
            ddl_translator,
            running: CancellationToken::new(),
            started: AtomicBool::new(false),
        }
    }

    /// Replace the dialect's DDL translator.
    pub fn with_ddl_translator(mut self, translator: Arc<dyn DdlTranslator>) -> Self {
        self.ddl_translator = translator;
        self
    }

    pub fn history(&self) -> &Arc<SchemaHistoryCache> {
        &self.history
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire) && !self.running.is_cancelled()
    }

    /// Read `tables` until the engine ends, fails, or [`stop`](Self::stop)
    /// is called.
    ///
    /// A session runs at most once. Stopping before starting makes `start`
    /// return immediately.
    pub async fn start(
        &self,
        tables: &[String],
        start: Option<StartPosition>,
        batch_size_hint: usize,
        consumer: Arc<dyn StreamConsumer>,
    ) -> Result<()> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(CdcError::invalid_state("stream session already started"));
        }
        if self.running.is_cancelled() {
            info!("Stream session stopped before start");
            return Ok(());
        }
        let _guard = self.running.clone().drop_guard();

        self.config.validate()?;
        let batch_size = effective_batch_size(batch_size_hint);
        let identity = SessionIdentity::mint_or_recover(self.state.as_ref()).await?;
        self.history.load(self.state.as_ref()).await?;

        let start_position = start
            .map(|p| p.into_stream_position(&identity.name, self.config.source_server_id))
            .transpose()?;
        let engine_config = self.config.engine_config(
            &identity,
            tables,
            start_position.as_ref(),
            batch_size,
            self.config.resolve_replica_id(),
        )?;
        info!(
            "Starting binlog reader, server name: {}, first run: {}",
            identity.name, identity.first_time
        );
        info!("Starting binlog reader with config {}", engine_config);

        let (producer, queue) = event_queue(&self.config.queue_config(), self.running.clone());
        let failure = Arc::new(FailureSlot::default());

        let delivery = {
            let consumer = consumer.clone();
            let failure = failure.clone();
            let running = self.running.clone();
            tokio::spawn(async move {
                match run_delivery_loop(queue, consumer.as_ref()).await {
                    Ok(delivered) => delivered,
                    Err(e) => {
                        error!("Event delivery failed: {}", e);
                        failure.record(e);
                        running.cancel();
                        0
                    }
                }
            })
        };

        let timer = tokio::spawn(run_persistence_timer(
            self.history.clone(),
            self.state.clone(),
            self.config.history_interval(),
            self.running.clone(),
        ));

        let closer = {
            let engine = self.engine.clone();
            let running = self.running.clone();
            tokio::spawn(async move {
                running.cancelled().await;
                if let Err(e) = engine.close().await {
                    warn!("Close CDC engine failed, error: {}", e);
                }
            })
        };

        let handler = Arc::new(SessionHandler {
            translator: RecordTranslator::new(
                identity.name.clone(),
                self.catalog.clone(),
                self.ddl_translator.clone(),
                self.history.clone(),
            ),
            producer: Mutex::new(Some(producer)),
            consumer,
            failure: failure.clone(),
            running: self.running.clone(),
        });

        self.engine
            .run(engine_config, handler.clone() as Arc<dyn EngineHandler>)
            .await;

        handler.close_queue();

        match delivery.await {
            Ok(delivered) => debug!("Delivered {} events", delivered),
            Err(e) => failure.record(CdcError::other(format!("Delivery task failed: {}", e))),
        }
        // Nothing is delivered past this point.
        handler.consumer.stream_read_ended().await;
        self.running.cancel();
        if let Err(e) = timer.await {
            warn!("Schema history timer failed: {}", e);
        }
        if let Err(e) = closer.await {
            warn!("Engine close task failed: {}", e);
        }

        info!("Binlog reader stopped");
        match failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Stop the session. Idempotent and callable from any task.
    pub fn stop(&self) {
        if !self.running.is_cancelled() {
            info!("Stopping binlog reader");
            self.running.cancel();
        }
    }
}
