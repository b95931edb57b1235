//! Raw record builders

use binlog_cdc::common::{RawRow, RawValue, RecordValue, SourceMetadata, SourceRecord};
use serde_json::{json, Map, Value};

pub const BINLOG_FILE: &str = "mysql-bin.000004";
pub const ENGINE_SERVER_NAME: &str = "scripted";

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn record(pos: u64, value: RecordValue) -> SourceRecord {
    SourceRecord::new(
        object(json!({ "server": ENGINE_SERVER_NAME })),
        object(json!({ "file": BINLOG_FILE, "pos": pos, "server_id": 1 })),
        value,
    )
}

fn source(table: &str, ts_ms: i64) -> SourceMetadata {
    SourceMetadata {
        ts_ms,
        db: Some("shop".to_string()),
        table: Some(table.to_string()),
    }
}

/// Row image of the `orders` table.
pub fn order_row(id: i64) -> RawRow {
    let mut row = RawRow::new();
    row.insert("id".to_string(), RawValue::Int64(id));
    row.insert(
        "created_at".to_string(),
        RawValue::Int64(1_700_000_000_000 + id * 1000),
    );
    row.insert("ship_date".to_string(), RawValue::Int32(5));
    row.insert("note".to_string(), RawValue::String(format!("order {}", id)));
    row
}

pub fn dml(op: &str, table: &str, pos: u64, before: Option<RawRow>, after: Option<RawRow>) -> SourceRecord {
    record(
        pos,
        RecordValue {
            op: Some(op.to_string()),
            before,
            after,
            ddl: None,
            source: source(table, pos as i64),
        },
    )
}

pub fn insert(id: i64, pos: u64) -> SourceRecord {
    dml("c", "orders", pos, None, Some(order_row(id)))
}

pub fn update(id: i64, pos: u64) -> SourceRecord {
    dml("u", "orders", pos, Some(order_row(id)), Some(order_row(id)))
}

pub fn delete(id: i64, pos: u64) -> SourceRecord {
    dml("d", "orders", pos, Some(order_row(id)), None)
}

pub fn ddl(statement: &str, pos: u64, ts_ms: i64) -> SourceRecord {
    record(
        pos,
        RecordValue {
            ddl: Some(statement.to_string()),
            source: SourceMetadata {
                ts_ms,
                db: Some("shop".to_string()),
                table: None,
            },
            ..Default::default()
        },
    )
}

/// Record without a value, as emitted for heartbeats.
pub fn heartbeat(pos: u64) -> SourceRecord {
    SourceRecord {
        value: None,
        ..record(pos, RecordValue::default())
    }
}
