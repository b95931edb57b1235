//! Error types for CDC operations
//!
//! One error enum for the whole pipeline. Translation-time variants
//! ([`CdcError::MissingSection`], [`CdcError::DdlTranslation`],
//! [`CdcError::ColumnRead`]) are fatal and abort the stream; the first one
//! is returned to the caller of `start` after cleanup. Engine-reported
//! failures surface as [`CdcError::Engine`].
//! Unrecognized operations and cancellation are not errors at all.

use crate::common::Row;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error used for causes that come from collaborators (cursors, engines).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error categories for metrics and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or untranslatable log records
    Translation,
    /// Replication engine lifecycle errors
    Replication,
    /// Schema-related errors (DDL, catalog)
    Schema,
    /// Configuration errors (invalid settings)
    Configuration,
    /// State store and I/O errors
    Storage,
    /// Serialization and compression errors
    Serialization,
    /// Other/unknown errors
    Other,
}

/// CDC-specific errors
#[derive(Error, Debug)]
pub enum CdcError {
    /// Reading one column of a row failed
    #[error("Read column value failed, row: {row}, column name: {column}, data: {partial:?}; error: {source}")]
    ColumnRead {
        /// 1-based row number within the read
        row: u64,
        /// Column being read when the failure happened
        column: String,
        /// Columns read so far for this row
        partial: Row,
        #[source]
        source: BoxError,
    },

    /// A DML record lacks a section its operation requires
    #[error("Found {op} record does not have {section}: {record}")]
    MissingSection {
        op: &'static str,
        section: &'static str,
        record: String,
    },

    /// The DDL translator rejected a statement
    #[error("Handle ddl failed: {ddl}, error: {source}")]
    DdlTranslation {
        ddl: String,
        #[source]
        source: Box<CdcError>,
    },

    /// The tailing engine reported a failure
    #[error("Engine error: {0}")]
    Engine(String),

    /// Schema history compression/decompression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// Invalid stream position or offset shape
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// Schema inference error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// State store error
    #[error("State store error: {0}")]
    State(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl CdcError {
    /// Create a missing-section error for a malformed DML record.
    pub fn missing_section(
        op: &'static str,
        section: &'static str,
        record: impl std::fmt::Debug,
    ) -> Self {
        Self::MissingSection {
            op,
            section,
            record: format!("{:?}", record),
        }
    }

    /// Wrap a DDL translator failure with the offending statement.
    pub fn ddl_translation(ddl: impl Into<String>, source: CdcError) -> Self {
        Self::DdlTranslation {
            ddl: ddl.into(),
            source: Box::new(source),
        }
    }

    /// Create a column read error with row context.
    pub fn column_read(row: u64, column: impl Into<String>, partial: Row, source: BoxError) -> Self {
        Self::ColumnRead {
            row,
            column: column.into(),
            partial,
            source,
        }
    }

    /// Create an engine lifecycle error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create a compression error
    pub fn compression(msg: impl Into<String>) -> Self {
        Self::Compression(msg.into())
    }

    /// Create an invalid position error
    pub fn invalid_position(msg: impl Into<String>) -> Self {
        Self::InvalidPosition(msg.into())
    }

    /// Create a new schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a state store error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Create a new serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Check if this error is retriable.
    ///
    /// Returns true for transient errors where restarting the stream from the
    /// last delivered position may succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,

            Self::Engine(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("temporarily")
                    || msg.contains("connection reset")
                    || msg.contains("connection lost")
                    || msg.contains("lost connection")
            }

            Self::Io(e) => {
                use std::io::ErrorKind;
                matches!(
                    e.kind(),
                    ErrorKind::ConnectionReset
                        | ErrorKind::ConnectionAborted
                        | ErrorKind::TimedOut
                        | ErrorKind::Interrupted
                )
            }

            // Compression failures are retried by the persistence timer itself
            Self::Compression(_) => true,

            Self::ColumnRead { .. }
            | Self::MissingSection { .. }
            | Self::DdlTranslation { .. }
            | Self::InvalidPosition(_)
            | Self::Schema(_)
            | Self::Config(_)
            | Self::State(_)
            | Self::Serialization(_)
            | Self::Json(_)
            | Self::InvalidState(_)
            | Self::Other(_) => false,
        }
    }

    /// Check if this error must abort the stream.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Compression(_))
    }

    /// Get the error category for metrics and alerting.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ColumnRead { .. } => ErrorCategory::Translation,
            Self::MissingSection { .. } => ErrorCategory::Translation,
            Self::DdlTranslation { .. } => ErrorCategory::Schema,
            Self::Engine(_) => ErrorCategory::Replication,
            Self::Timeout(_) => ErrorCategory::Replication,
            Self::InvalidPosition(_) => ErrorCategory::Configuration,
            Self::Schema(_) => ErrorCategory::Schema,
            Self::Config(_) => ErrorCategory::Configuration,
            Self::State(_) => ErrorCategory::Storage,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Compression(_) => ErrorCategory::Serialization,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Json(_) => ErrorCategory::Serialization,
            Self::InvalidState(_) => ErrorCategory::Other,
            Self::Other(_) => ErrorCategory::Other,
        }
    }

    /// Get a metric-safe error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnRead { .. } => "column_read_error",
            Self::MissingSection { .. } => "missing_section",
            Self::DdlTranslation { .. } => "ddl_translation_error",
            Self::Engine(_) => "engine_error",
            Self::Compression(_) => "compression_error",
            Self::InvalidPosition(_) => "invalid_position",
            Self::Schema(_) => "schema_error",
            Self::Config(_) => "config_error",
            Self::State(_) => "state_error",
            Self::Serialization(_) => "serialization_error",
            Self::Json(_) => "json_error",
            Self::Io(_) => "io_error",
            Self::Timeout(_) => "timeout",
            Self::InvalidState(_) => "invalid_state",
            Self::Other(_) => "unknown",
        }
    }
}

/// Result type for CDC operations
pub type Result<T> = std::result::Result<T, CdcError>;
