//! MySQL/MariaDB binlog reader
//!
//! Supports:
//! - Row-based replication through an external tailing engine
//! - Coarse (file + offset) and structured start positions
//! - Per-table DDL history persisted across restarts
//! - Pluggable DDL dialects
//!
//! # Architecture
//!
//! ```text
//! TailingEngine → SessionHandler → RecordTranslator → EventQueue → StreamConsumer
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use binlog_cdc::mariadb::{ReaderConfig, StreamSession};
//!
//! let config = ReaderConfig::new("localhost", "cdc", "shop").with_password("secret");
//! let session = StreamSession::new(config, engine, state, catalog, history);
//! session.start(&["orders".to_string()], None, 1000, consumer).await?;
//! ```

pub mod config;
pub mod session;

pub use config::{effective_batch_size, ReaderConfig, MIN_BATCH_SIZE, QUEUE_SIZE_FACTOR, REPLICA_ID_RANGE};
pub use session::StreamSession;
