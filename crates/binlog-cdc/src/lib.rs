//! # binlog-cdc - Binlog change data capture
//!
//! Tails a MySQL/MariaDB transaction log through an opaque engine and turns
//! raw log records into normalized change events with resumable positions.
//!
//! ## Features
//!
//! - `mariadb` - The stream session and its configuration (default)
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   ┌──────────────────┐   ┌────────────┐   ┌────────────────┐
//! │ TailingEngine │──▶│ RecordTranslator │──▶│ EventQueue │──▶│ StreamConsumer │
//! └───────────────┘   └────────┬─────────┘   └────────────┘   └────────────────┘
//!                              ▼
//!                     ┌──────────────────┐   ┌────────────┐
//!                     │SchemaHistoryCache│──▶│ StateStore │
//!                     └──────────────────┘   └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use binlog_cdc::mariadb::{ReaderConfig, StreamSession};
//! use binlog_cdc::{BinlogPosition, MemoryCatalog, MemoryStateStore, SchemaHistoryCache};
//! use std::sync::Arc;
//!
//! let session = StreamSession::new(
//!     ReaderConfig::new("localhost", "cdc", "shop"),
//!     engine,
//!     Arc::new(MemoryStateStore::new()),
//!     Arc::new(MemoryCatalog::new()),
//!     Arc::new(SchemaHistoryCache::new()),
//! );
//! let start = BinlogPosition::new("mysql-bin.000003", 154);
//! session.start(&tables, Some(start.into()), 1000, consumer).await?;
//! ```

pub mod common;

pub use common::{
    // Error handling
    CdcError,
    ErrorCategory,
    Result,
    // Events and positions
    BinlogPosition,
    ChangeEvent,
    ChangeOp,
    FieldValue,
    Row,
    StartPosition,
    StreamPosition,
    // Collaborators
    EngineHandler,
    EngineOutcome,
    StreamConsumer,
    TailingEngine,
    // Catalog, state and history
    MemoryCatalog,
    MemoryStateStore,
    FileStateStore,
    SchemaHistoryCache,
    StateStore,
    TableCatalog,
    // DDL
    DdlDialect,
    DdlTranslator,
    SchemaOperation,
};

// MySQL/MariaDB reader - feature-gated
#[cfg(feature = "mariadb")]
pub mod mariadb;
