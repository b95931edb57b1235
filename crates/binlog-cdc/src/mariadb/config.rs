//! Reader configuration
//!
//! [`ReaderConfig`] holds the connection and tuning options of one reader
//! task. [`ReaderConfig::engine_config`] turns it, together with a session
//! identity and a start request, into the property map handed to the
//! tailing engine.

use crate::common::{
    CdcError, DdlDialect, EngineConfig, QueueConfig, Result, SessionIdentity, StreamPosition,
    DEFAULT_PERSIST_INTERVAL, DEFAULT_POLL_TIMEOUT, DEFAULT_QUEUE_CAPACITY,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Floor for the engine batch size.
pub const MIN_BATCH_SIZE: usize = 1000;

/// Engine queue size as a multiple of the batch size.
pub const QUEUE_SIZE_FACTOR: usize = 8;

/// Replication client ids picked when none is configured.
pub const REPLICA_ID_RANGE: RangeInclusive<u32> = 5400..=6400;

/// Clamp a requested batch size to [`MIN_BATCH_SIZE`].
pub fn effective_batch_size(hint: usize) -> usize {
    hint.max(MIN_BATCH_SIZE)
}

/// Connection and tuning options of a binlog reader.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Source host
    pub host: String,
    /// Source port (default: 3306)
    pub port: u16,
    /// Username for authentication
    pub user: String,
    /// Password for authentication
    pub password: Option<String>,
    /// Database whose tables are read
    pub database: String,
    /// Server id of the source, recorded in every offset
    pub source_server_id: u32,
    /// Replication client id (random within [`REPLICA_ID_RANGE`] if unset)
    pub replica_id: Option<u32>,
    /// DDL grammar used for schema change events
    pub ddl_dialect: DdlDialect,
    /// Capacity of the event queue
    pub queue_capacity: usize,
    /// Wait bound for one queue operation, in milliseconds
    pub poll_timeout_ms: u64,
    /// Delay between schema history writes, in milliseconds
    pub history_interval_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: String::new(),
            password: None,
            database: String::new(),
            source_server_id: 1,
            replica_id: None,
            ddl_dialect: DdlDialect::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT.as_millis() as u64,
            history_interval_ms: DEFAULT_PERSIST_INTERVAL.as_millis() as u64,
        }
    }
}

impl std::fmt::Debug for ReaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("database", &self.database)
            .field("source_server_id", &self.source_server_id)
            .field("replica_id", &self.replica_id)
            .field("ddl_dialect", &self.ddl_dialect)
            .field("queue_capacity", &self.queue_capacity)
            .field("poll_timeout_ms", &self.poll_timeout_ms)
            .field("history_interval_ms", &self.history_interval_ms)
            .finish()
    }
}

impl ReaderConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_source_server_id(mut self, server_id: u32) -> Self {
        self.source_server_id = server_id;
        self
    }

    pub fn with_replica_id(mut self, replica_id: u32) -> Self {
        self.replica_id = Some(replica_id);
        self
    }

    pub fn with_ddl_dialect(mut self, dialect: DdlDialect) -> Self {
        self.ddl_dialect = dialect;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_history_interval(mut self, interval: Duration) -> Self {
        self.history_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Parse from a JSON options map.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)
            .map_err(|e| CdcError::config(format!("Invalid reader config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(CdcError::config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(CdcError::config("port must not be 0"));
        }
        if self.user.is_empty() {
            return Err(CdcError::config("user must not be empty"));
        }
        if self.database.is_empty() {
            return Err(CdcError::config("database must not be empty"));
        }
        if self.queue_capacity == 0 {
            return Err(CdcError::config("queue_capacity must be at least 1"));
        }
        if self.poll_timeout_ms == 0 || self.history_interval_ms == 0 {
            return Err(CdcError::config("timeouts and intervals must be positive"));
        }
        Ok(())
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig::default()
            .with_capacity(self.queue_capacity)
            .with_poll_timeout(Duration::from_millis(self.poll_timeout_ms))
    }

    pub fn history_interval(&self) -> Duration {
        Duration::from_millis(self.history_interval_ms)
    }

    /// Replication client id for one engine run.
    pub fn resolve_replica_id(&self) -> u32 {
        self.replica_id
            .unwrap_or_else(|| rand::thread_rng().gen_range(REPLICA_ID_RANGE))
    }

    /// Build the engine property map for one run.
    ///
    /// `batch_size` is used as given; callers clamp it with
    /// [`effective_batch_size`] first.
    pub fn engine_config(
        &self,
        identity: &SessionIdentity,
        tables: &[String],
        start: Option<&StreamPosition>,
        batch_size: usize,
        replica_id: u32,
    ) -> Result<EngineConfig> {
        let name = identity.name.as_str();
        let qualified: Vec<String> = tables
            .iter()
            .map(|t| format!("{}.{}", self.database, t))
            .collect();

        let mut config = EngineConfig::new()
            .with("name", name)
            .with("database.hostname", &self.host)
            .with("database.port", self.port)
            .with("database.user", &self.user)
            .with("database.password", self.password.as_deref().unwrap_or_default())
            .with("database.server.name", name)
            .with("database.server.id", replica_id)
            .with("threadName", format!("binlog-reader-{}", name))
            .with("database.history.skip.unparseable.ddl", true)
            .with("database.history.store.only.monitored.tables.ddl", true)
            .with("database.history.store.only.captured.tables.ddl", true)
            .with("snapshot.locking.mode", "none")
            .with("snapshot.mode", "schema_only_recovery")
            .with("time.precision.mode", "adaptive_time_microseconds")
            .with("max.queue.size", batch_size.saturating_mul(QUEUE_SIZE_FACTOR))
            .with("max.batch.size", batch_size)
            .with("database.include.list", &self.database)
            .with("table.include.list", qualified.join(","));

        if let Some(position) = start {
            config.set("offset.string", serde_json::to_string(position)?);
        }

        Ok(config)
    }
}
