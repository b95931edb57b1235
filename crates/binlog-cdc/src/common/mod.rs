//! # Common CDC Types and Traits
//!
//! Source-agnostic building blocks of the log reader:
//!
//! - [`StreamPosition`] / [`BinlogPosition`] - Resumable positions
//! - [`SourceRecord`] / [`RecordKind`] - Raw engine records, classified once
//! - [`RecordTranslator`] - Raw record to [`ChangeEvent`] translation
//! - [`DdlTranslator`] - Pluggable DDL grammar ([`DdlDialect`])
//! - [`SchemaHistoryCache`] - Per-table DDL history with persistence
//! - [`event_queue`] / [`run_delivery_loop`] - Bounded hand-off to the consumer
//! - [`StateStore`] - Per-task key/value state
//! - [`TailingEngine`] / [`EngineHandler`] / [`StreamConsumer`] - Collaborator seams
//! - [`read_with_offset`] / [`read_with_filter`] - Snapshot row reading
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  on_record   ┌──────────────────┐  enqueue  ┌────────────┐
//! │TailingEngine │ ───────────▶ │ RecordTranslator │ ────────▶ │ EventQueue │
//! └──────────────┘              └────────┬─────────┘           └─────┬──────┘
//!                                        │ record_ddl                │ dequeue
//!                                        ▼                           ▼
//!                               ┌──────────────────┐        ┌────────────────┐
//!                               │SchemaHistoryCache│        │ Delivery loop  │
//!                               └────────┬─────────┘        └───────┬────────┘
//!                                        │ persist (timer)          │ accept
//!                                        ▼                          ▼
//!                               ┌──────────────────┐        ┌────────────────┐
//!                               │    StateStore    │        │ StreamConsumer │
//!                               └──────────────────┘        └────────────────┘
//! ```

mod catalog;
pub mod coercion;
mod ddl;
mod delivery;
mod engine;
mod error;
mod event;
mod identity;
mod position;
mod queue;
mod record;
mod schema_history;
mod snapshot;
mod state;
mod traits;
mod translator;

pub use catalog::{FieldType, MemoryCatalog, TableCatalog, TableSchema};
pub use ddl::{
    BasicDdlTranslator, ColumnDefinition, DdlDialect, DdlTranslator, PassthroughDdlTranslator,
    SchemaChange, SchemaChangeType, SchemaOperation,
};
pub use delivery::run_delivery_loop;
pub use engine::EngineConfig;
pub use error::{BoxError, CdcError, ErrorCategory, Result};
pub use event::{ChangeEvent, ChangeOp, FieldValue, Row, StreamEvent};
pub use identity::{SessionIdentity, FIRST_TIME_KEY, SERVER_NAME_KEY};
pub use position::{
    BinlogPosition, StartPosition, StreamPosition, FILE_OFFSET_KEY, POS_OFFSET_KEY,
    SERVER_ID_OFFSET_KEY, SERVER_PARTITION_KEY,
};
pub use queue::{
    event_queue, Dequeued, EventConsumer, EventProducer, QueueConfig, DEFAULT_POLL_TIMEOUT,
    DEFAULT_QUEUE_CAPACITY,
};
pub use record::{
    DdlRecord, DmlRecord, OpCode, RawRow, RawValue, RecordKind, RecordValue, SourceMetadata,
    SourceRecord,
};
pub use schema_history::{
    run_persistence_timer, HistorySnapshot, PersistOutcome, SchemaHistoryCache,
    DEFAULT_PERSIST_INTERVAL, SCHEMA_HISTORY_KEY,
};
pub use snapshot::{read_with_filter, read_with_offset, RowCursor, SnapshotOffset};
pub use state::{FileStateStore, MemoryStateStore, SharedStateStore, StateStore};
pub use traits::{EngineHandler, EngineOutcome, StreamConsumer, TailingEngine};
pub use translator::RecordTranslator;
