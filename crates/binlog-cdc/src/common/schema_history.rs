//! Schema history cache
//!
//! Keeps, per table, the ordered set of DDL statements seen so far. The cache
//! is shared by `Arc` across sessions of one reader task and only ever grows.
//!
//! Persistence writes a gzip-compressed, base64-encoded JSON snapshot under
//! [`SCHEMA_HISTORY_KEY`], and only when something changed since the last
//! successful write. Dirty tracking covers the whole cache: one change marks
//! everything for the next write. At most one write is in flight at a time;
//! a concurrent attempt returns [`PersistOutcome::InFlight`] without waiting.

use crate::common::{CdcError, Result, SharedStateStore, StateStore};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// State key holding the compressed history snapshot.
pub const SCHEMA_HISTORY_KEY: &str = "MYSQL_SCHEMA_HISTORY";

/// Default delay between persistence attempts.
pub const DEFAULT_PERSIST_INTERVAL: Duration = Duration::from_secs(10);

/// Table name to DDL statements, in the order first seen.
pub type HistorySnapshot = BTreeMap<String, Vec<String>>;

/// Result of a persistence attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Snapshot written
    Persisted,
    /// Nothing changed since the last write
    Clean,
    /// Another attempt holds the gate
    InFlight,
}

#[derive(Debug, Default)]
pub struct SchemaHistoryCache {
    tables: RwLock<HistorySnapshot>,
    /// Bumped on every mutation, under the write lock
    generation: AtomicU64,
    /// Generation captured by the last successful write
    persisted: AtomicU64,
    persist_gate: tokio::sync::Mutex<()>,
}

impl SchemaHistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `statement` for `table`. Returns false if it was already known.
    pub fn record_ddl(&self, table: &str, statement: &str) -> bool {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let statements = tables.entry(table.to_string()).or_default();
        if statements.iter().any(|s| s == statement) {
            return false;
        }
        statements.push(statement.to_string());
        self.generation.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Statements recorded for `table`, oldest first.
    pub fn history(&self, table: &str) -> Vec<String> {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn table_count(&self) -> usize {
        self.tables.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True if the cache changed since the last successful write.
    pub fn is_dirty(&self) -> bool {
        self.generation.load(Ordering::Acquire) != self.persisted.load(Ordering::Acquire)
    }

    /// Write the snapshot to `store` if the cache is dirty.
    ///
    /// A compression failure leaves the cache dirty so the next attempt
    /// retries it.
    pub async fn persist_if_dirty(&self, store: &dyn StateStore) -> Result<PersistOutcome> {
        let Ok(_gate) = self.persist_gate.try_lock() else {
            return Ok(PersistOutcome::InFlight);
        };

        let (generation, snapshot) = {
            let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
            (self.generation.load(Ordering::Acquire), tables.clone())
        };
        if generation == self.persisted.load(Ordering::Acquire) {
            return Ok(PersistOutcome::Clean);
        }

        let blob = compress(&snapshot)?;
        store.put(SCHEMA_HISTORY_KEY, Value::String(blob)).await?;
        self.persisted.store(generation, Ordering::Release);

        debug!("Persisted schema history for {} tables", snapshot.len());
        Ok(PersistOutcome::Persisted)
    }

    /// Merge a previously persisted snapshot into the cache.
    ///
    /// Returns the number of statements added. The cache stays clean when
    /// it ends up identical to what the store holds.
    pub async fn load(&self, store: &dyn StateStore) -> Result<usize> {
        let Some(blob) = store.get_string(SCHEMA_HISTORY_KEY).await? else {
            return Ok(0);
        };
        let stored = decompress(&blob)?;

        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let mut added = 0;
        for (table, statements) in &stored {
            let known = tables.entry(table.clone()).or_default();
            for statement in statements {
                if !known.contains(statement) {
                    known.push(statement.clone());
                    added += 1;
                }
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if *tables == stored {
            self.persisted.store(generation, Ordering::Release);
        }

        info!(
            "Loaded schema history: {} tables, {} statements added",
            stored.len(),
            added
        );
        Ok(added)
    }
}

/// Serialize, gzip and base64-encode a history snapshot.
pub fn compress(snapshot: &HistorySnapshot) -> Result<String> {
    let json = serde_json::to_vec(snapshot)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| CdcError::compression(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| CdcError::compression(e.to_string()))?;
    Ok(STANDARD.encode(compressed))
}

/// Inverse of [`compress`].
pub fn decompress(blob: &str) -> Result<HistorySnapshot> {
    let compressed = STANDARD
        .decode(blob)
        .map_err(|e| CdcError::compression(format!("invalid base64: {}", e)))?;
    let mut json = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut json)
        .map_err(|e| CdcError::compression(e.to_string()))?;
    Ok(serde_json::from_slice(&json)?)
}

/// Periodically persist `cache` until `token` is cancelled, then make one
/// last attempt.
pub async fn run_persistence_timer(
    cache: Arc<SchemaHistoryCache>,
    store: SharedStateStore,
    interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => persist_logged(&cache, store.as_ref()).await,
        }
    }

    persist_logged(&cache, store.as_ref()).await;
    debug!("Schema history persistence stopped");
}

async fn persist_logged(cache: &SchemaHistoryCache, store: &dyn StateStore) {
    match cache.persist_if_dirty(store).await {
        Ok(PersistOutcome::Persisted) => trace!("Schema history saved"),
        Ok(_) => {}
        Err(e) => warn!("Failed to persist schema history: {}", e),
    }
}
