//! Raw records handed over by the tailing engine
//!
//! The engine speaks in loosely-shaped records: a partition/offset pair plus
//! an optional value that may hold a row change, a DDL statement, or neither
//! (heartbeats, transaction markers). [`SourceRecord::classify`] inspects that
//! shape exactly once and everything downstream works with [`RecordKind`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Column value as produced by the engine, before coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RawValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Decimal(String),
    String(String),
    Bytes(Vec<u8>),
    Json(Value),
}

impl RawValue {
    /// Integer payload of either width.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RawValue::Int32(v) => Some(i64::from(*v)),
            RawValue::Int64(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Int32(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int64(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::String(v.to_string())
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(v: Vec<u8>) -> Self {
        RawValue::Bytes(v)
    }
}

pub type RawRow = BTreeMap<String, RawValue>;

/// Where in the source the record came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Source event time, Unix epoch millis
    #[serde(default)]
    pub ts_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

/// Payload of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordValue {
    /// Operation code for row changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<RawRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<RawRow>,
    /// Statement text for schema changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddl: Option<String>,
    #[serde(default)]
    pub source: SourceMetadata,
}

/// One record from the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(default)]
    pub partition: Map<String, Value>,
    #[serde(default)]
    pub offset: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RecordValue>,
}

/// Row change operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Create,
    Update,
    Delete,
}

impl OpCode {
    /// Parse a wire op code. Unknown codes yield `None`.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "c" => Some(OpCode::Create),
            "u" => Some(OpCode::Update),
            "d" => Some(OpCode::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OpCode::Create => "insert",
            OpCode::Update => "update",
            OpCode::Delete => "delete",
        }
    }
}

/// Row-level change.
#[derive(Debug, Clone, PartialEq)]
pub struct DmlRecord {
    /// Wire op code, kept raw so unknown codes can be logged
    pub op: String,
    pub table: String,
    pub before: Option<RawRow>,
    pub after: Option<RawRow>,
    pub reference_time: i64,
}

/// Statement-level schema change.
#[derive(Debug, Clone, PartialEq)]
pub struct DdlRecord {
    pub ddl: String,
    pub database: Option<String>,
    pub reference_time: i64,
}

/// Shape of a record, decided once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordKind {
    Dml(DmlRecord),
    Ddl(DdlRecord),
    /// Heartbeats, transaction markers and anything else without an event
    Other,
}

impl SourceRecord {
    pub fn new(partition: Map<String, Value>, offset: Map<String, Value>, value: RecordValue) -> Self {
        Self {
            partition,
            offset,
            value: Some(value),
        }
    }

    /// Split into the position pieces and the classified payload.
    pub fn classify(self) -> (Map<String, Value>, Map<String, Value>, RecordKind) {
        let kind = match self.value {
            None => RecordKind::Other,
            Some(RecordValue {
                op: Some(op),
                before,
                after,
                source,
                ..
            }) => RecordKind::Dml(DmlRecord {
                op,
                table: source.table.unwrap_or_default(),
                before,
                after,
                reference_time: source.ts_ms,
            }),
            Some(RecordValue {
                ddl: Some(ddl),
                source,
                ..
            }) => RecordKind::Ddl(DdlRecord {
                ddl,
                database: source.db,
                reference_time: source.ts_ms,
            }),
            Some(_) => RecordKind::Other,
        };
        (self.partition, self.offset, kind)
    }
}
