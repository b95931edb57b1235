//! Test harness for stream session integration tests
//!
//! Provides in-process stand-ins for the reader's collaborators:
//! - A scripted tailing engine that replays records and lifecycle steps
//! - A recording consumer that captures every delivered batch
//! - Builders for raw engine records

#![allow(dead_code)]

pub mod consumer;
pub mod engine;
pub mod records;

pub use consumer::{Call, RecordingConsumer};
pub use engine::{ScriptedEngine, Step};
pub use records::*;

use binlog_cdc::common::{MemoryCatalog, SchemaHistoryCache, SharedStateStore};
use binlog_cdc::mariadb::{ReaderConfig, StreamSession};
use std::sync::{Arc, Once};
use std::time::Duration;

static INIT: Once = Once::new();

/// Initialize test logging (idempotent)
pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("binlog_cdc=debug".parse().unwrap()),
            )
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Upper bound for any single session run in tests
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(10);

pub fn reader_config() -> ReaderConfig {
    ReaderConfig::new("127.0.0.1", "cdc", "shop")
        .with_password("hunter2")
        .with_source_server_id(1)
        .with_replica_id(5500)
}

pub fn tables(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Build a session over `engine` with the given shared state and history.
pub fn session(
    engine: Arc<ScriptedEngine>,
    state: SharedStateStore,
    history: Arc<SchemaHistoryCache>,
) -> StreamSession {
    StreamSession::new(
        reader_config(),
        engine,
        state,
        Arc::new(orders_catalog()),
        history,
    )
}

pub fn orders_catalog() -> MemoryCatalog {
    use binlog_cdc::common::{FieldType, TableSchema};

    MemoryCatalog::new().with_table(
        TableSchema::new("orders")
            .with_field("id", FieldType::other("BIGINT"))
            .with_field("created_at", FieldType::datetime(0))
            .with_field("ship_date", FieldType::Date)
            .with_primary_key("id"),
    )
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
