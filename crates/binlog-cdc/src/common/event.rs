//! Change event representation
//!
//! Normalized events produced from raw log records. Row-level DML and
//! statement-level DDL share one enum so that a single ordered stream can
//! carry both.
//!
//! ```ignore
//! let event = ChangeEvent::insert("users", row, 1_705_000_000_000);
//! assert_eq!(event.op(), ChangeOp::Insert);
//! ```

use crate::common::{SchemaOperation, StreamPosition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single column value after translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Decimal kept in its exact textual form
    Decimal(String),
    String(String),
    /// Raw bytes (binary, blob, bit columns)
    Bytes(Vec<u8>),
    /// Point in time parsed from an ISO-8601 string
    Instant(DateTime<Utc>),
    /// Structured value the engine handed over as JSON
    Json(serde_json::Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(v) | FieldValue::Decimal(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

/// Column name to value mapping for one row image.
pub type Row = BTreeMap<String, FieldValue>;

/// Operation kind of a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeOp {
    /// Row inserted
    Insert,
    /// Row updated
    Update,
    /// Row deleted
    Delete,
    /// Table structure changed (DDL)
    SchemaChange,
}

impl std::fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeOp::Insert => write!(f, "INSERT"),
            ChangeOp::Update => write!(f, "UPDATE"),
            ChangeOp::Delete => write!(f, "DELETE"),
            ChangeOp::SchemaChange => write!(f, "SCHEMA_CHANGE"),
        }
    }
}

/// Normalized change captured from the source log.
///
/// `reference_time` is the source event time in Unix epoch millis, never the
/// wall clock at translation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ChangeEvent {
    Insert {
        table: String,
        after: Row,
        reference_time: i64,
    },
    Update {
        table: String,
        /// Previous row image, present only when the source captured it
        #[serde(default, skip_serializing_if = "Option::is_none")]
        before: Option<Row>,
        after: Row,
        reference_time: i64,
    },
    Delete {
        table: String,
        before: Row,
        reference_time: i64,
    },
    SchemaChange {
        table: String,
        operation: SchemaOperation,
        reference_time: i64,
    },
}

impl ChangeEvent {
    /// Create a new INSERT event
    pub fn insert(table: impl Into<String>, after: Row, reference_time: i64) -> Self {
        Self::Insert {
            table: table.into(),
            after,
            reference_time,
        }
    }

    /// Create a new UPDATE event
    pub fn update(
        table: impl Into<String>,
        before: Option<Row>,
        after: Row,
        reference_time: i64,
    ) -> Self {
        Self::Update {
            table: table.into(),
            before,
            after,
            reference_time,
        }
    }

    /// Create a new DELETE event
    pub fn delete(table: impl Into<String>, before: Row, reference_time: i64) -> Self {
        Self::Delete {
            table: table.into(),
            before,
            reference_time,
        }
    }

    /// Create a new schema change event
    pub fn schema_change(
        table: impl Into<String>,
        operation: SchemaOperation,
        reference_time: i64,
    ) -> Self {
        Self::SchemaChange {
            table: table.into(),
            operation,
            reference_time,
        }
    }

    pub fn op(&self) -> ChangeOp {
        match self {
            Self::Insert { .. } => ChangeOp::Insert,
            Self::Update { .. } => ChangeOp::Update,
            Self::Delete { .. } => ChangeOp::Delete,
            Self::SchemaChange { .. } => ChangeOp::SchemaChange,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Self::Insert { table, .. }
            | Self::Update { table, .. }
            | Self::Delete { table, .. }
            | Self::SchemaChange { table, .. } => table,
        }
    }

    pub fn reference_time(&self) -> i64 {
        match self {
            Self::Insert { reference_time, .. }
            | Self::Update { reference_time, .. }
            | Self::Delete { reference_time, .. }
            | Self::SchemaChange { reference_time, .. } => *reference_time,
        }
    }

    /// Row image before the change, if any.
    pub fn before(&self) -> Option<&Row> {
        match self {
            Self::Update { before, .. } => before.as_ref(),
            Self::Delete { before, .. } => Some(before),
            _ => None,
        }
    }

    /// Row image after the change, if any.
    pub fn after(&self) -> Option<&Row> {
        match self {
            Self::Insert { after, .. } | Self::Update { after, .. } => Some(after),
            _ => None,
        }
    }

    /// Check if this is a data modification event (INSERT/UPDATE/DELETE)
    pub fn is_dml(&self) -> bool {
        !self.is_ddl()
    }

    pub fn is_ddl(&self) -> bool {
        matches!(self, Self::SchemaChange { .. })
    }
}

/// A change event paired with the position to resume after it.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub event: ChangeEvent,
    pub position: StreamPosition,
}

impl StreamEvent {
    pub fn new(event: ChangeEvent, position: StreamPosition) -> Self {
        Self { event, position }
    }
}
