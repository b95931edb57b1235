//! Raw record translation
//!
//! Turns one [`SourceRecord`] into zero or more [`StreamEvent`]s:
//!
//! - row changes become one insert/update/delete event, with temporal
//!   columns coerced against the catalog;
//! - DDL statements go through the configured [`DdlTranslator`] and fan out
//!   into one schema change event per structural operation, all sharing the
//!   record's reference time and position;
//! - anything else (heartbeats, transaction markers, unknown op codes)
//!   produces nothing.
//!
//! A row change missing the image its operation requires, and a statement
//! the DDL translator rejects, are fatal.

use crate::common::coercion::convert_row;
use crate::common::{
    CdcError, ChangeEvent, DdlRecord, DdlTranslator, DmlRecord, OpCode, RecordKind, Result,
    SchemaHistoryCache, SourceRecord, StreamEvent, StreamPosition, TableCatalog,
};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

pub struct RecordTranslator {
    session_name: String,
    catalog: Arc<dyn TableCatalog>,
    ddl_translator: Arc<dyn DdlTranslator>,
    history: Arc<SchemaHistoryCache>,
}

impl RecordTranslator {
    pub fn new(
        session_name: impl Into<String>,
        catalog: Arc<dyn TableCatalog>,
        ddl_translator: Arc<dyn DdlTranslator>,
        history: Arc<SchemaHistoryCache>,
    ) -> Self {
        Self {
            session_name: session_name.into(),
            catalog,
            ddl_translator,
            history,
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn translate(&self, record: SourceRecord) -> Result<Vec<StreamEvent>> {
        let (partition, offset, kind) = record.classify();

        let events: Vec<ChangeEvent> = match kind {
            RecordKind::Dml(dml) => self.translate_dml(dml)?.into_iter().collect(),
            RecordKind::Ddl(ddl) => self.translate_ddl(ddl)?,
            RecordKind::Other => Vec::new(),
        };
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let position = self.position(&partition, &offset)?;
        for event in &events {
            if event.is_ddl() {
                info!(
                    "Read DDL event on {}: {:?} at {}",
                    event.table(),
                    event.op(),
                    position
                );
            } else {
                debug!("Read {} event on {} at {}", event.op(), event.table(), position);
            }
        }

        Ok(events
            .into_iter()
            .map(|event| StreamEvent::new(event, position.clone()))
            .collect())
    }

    /// Translate one row change. Unknown op codes yield `None`.
    pub fn translate_dml(&self, record: DmlRecord) -> Result<Option<ChangeEvent>> {
        let Some(op) = OpCode::parse(&record.op) else {
            debug!("Skipping record with unknown op '{}' on {}", record.op, record.table);
            return Ok(None);
        };

        let event = match op {
            OpCode::Create => {
                let Some(after) = record.after.clone() else {
                    return Err(CdcError::missing_section(op.as_str(), "after", &record));
                };
                ChangeEvent::insert(
                    record.table.clone(),
                    convert_row(&record.table, after, self.catalog.as_ref()),
                    record.reference_time,
                )
            }
            OpCode::Update => {
                let Some(after) = record.after.clone() else {
                    return Err(CdcError::missing_section(op.as_str(), "after", &record));
                };
                let before = record
                    .before
                    .clone()
                    .map(|raw| convert_row(&record.table, raw, self.catalog.as_ref()));
                ChangeEvent::update(
                    record.table.clone(),
                    before,
                    convert_row(&record.table, after, self.catalog.as_ref()),
                    record.reference_time,
                )
            }
            OpCode::Delete => {
                let Some(before) = record.before.clone() else {
                    return Err(CdcError::missing_section(op.as_str(), "before", &record));
                };
                ChangeEvent::delete(
                    record.table.clone(),
                    convert_row(&record.table, before, self.catalog.as_ref()),
                    record.reference_time,
                )
            }
        };

        Ok(Some(event))
    }

    /// Translate one DDL statement into schema change events and record it
    /// in the history of every table it touches.
    pub fn translate_ddl(&self, record: DdlRecord) -> Result<Vec<ChangeEvent>> {
        let changes = self
            .ddl_translator
            .translate(&record.ddl, self.catalog.as_ref())
            .map_err(|e| CdcError::ddl_translation(record.ddl.clone(), e))?;

        let tables: BTreeSet<&str> = changes.iter().map(|c| c.table.as_str()).collect();
        for table in tables {
            self.history.record_ddl(table, &record.ddl);
        }

        Ok(changes
            .into_iter()
            .map(|change| {
                ChangeEvent::schema_change(change.table, change.operation, record.reference_time)
            })
            .collect())
    }

    fn position(&self, partition: &Map<String, Value>, offset: &Map<String, Value>) -> Result<StreamPosition> {
        StreamPosition::from_source(self.session_name.clone(), partition, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{
        BasicDdlTranslator, ChangeOp, FieldType, FieldValue, MemoryCatalog, RawRow, RawValue,
        RecordValue, SchemaOperation, SourceMetadata, TableSchema,
    };
    use serde_json::json;

    fn translator() -> (RecordTranslator, Arc<SchemaHistoryCache>) {
        let catalog = MemoryCatalog::new().with_table(
            TableSchema::new("orders")
                .with_field("created", FieldType::datetime(0))
                .with_field("shipped_on", FieldType::Date),
        );
        let history = Arc::new(SchemaHistoryCache::new());
        let translator = RecordTranslator::new(
            "session-1",
            Arc::new(catalog),
            Arc::new(BasicDdlTranslator),
            history.clone(),
        );
        (translator, history)
    }

    fn source_record(value: RecordValue, pos: u64) -> SourceRecord {
        let partition = json!({ "server": "session-1" });
        let offset = json!({ "file": "bin.000001", "pos": pos, "server_id": 1 });
        SourceRecord::new(
            partition.as_object().unwrap().clone(),
            offset.as_object().unwrap().clone(),
            value,
        )
    }

    fn dml(op: &str, before: Option<RawRow>, after: Option<RawRow>) -> RecordValue {
        RecordValue {
            op: Some(op.to_string()),
            before,
            after,
            ddl: None,
            source: SourceMetadata {
                ts_ms: 1_700_000_000_500,
                db: Some("shop".to_string()),
                table: Some("orders".to_string()),
            },
        }
    }

    fn raw_row() -> RawRow {
        let mut row = RawRow::new();
        row.insert("id".to_string(), RawValue::Int64(7));
        row.insert("created".to_string(), RawValue::Int64(1_700_000_000_000));
        row.insert("shipped_on".to_string(), RawValue::Int32(5));
        row
    }

    #[test]
    fn test_insert_translation() {
        let (translator, _) = translator();
        let events = translator
            .translate(source_record(dml("c", None, Some(raw_row())), 120))
            .unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0].event;
        assert_eq!(event.op(), ChangeOp::Insert);
        assert_eq!(event.reference_time(), 1_700_000_000_500);

        let after = event.after().unwrap();
        assert_eq!(after["created"], FieldValue::Int(1_700_000_000));
        assert_eq!(after["shipped_on"], FieldValue::Int(432_000_000));
        assert_eq!(after["id"], FieldValue::Int(7));

        assert_eq!(events[0].position.name(), "session-1");
        assert_eq!(
            events[0].position.binlog_position().unwrap().position,
            120
        );
    }

    #[test]
    fn test_update_without_before() {
        let (translator, _) = translator();
        let events = translator
            .translate(source_record(dml("u", None, Some(raw_row())), 1))
            .unwrap();
        assert_eq!(events[0].event.op(), ChangeOp::Update);
        assert!(events[0].event.before().is_none());
    }

    #[test]
    fn test_unknown_op_is_skipped() {
        let (translator, _) = translator();
        let events = translator
            .translate(source_record(dml("r", None, Some(raw_row())), 1))
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_missing_sections_are_fatal() {
        let (translator, _) = translator();

        let err = translator
            .translate(source_record(dml("c", Some(raw_row()), None), 1))
            .unwrap_err();
        assert!(matches!(
            err,
            CdcError::MissingSection {
                section: "after",
                ..
            }
        ));

        let err = translator
            .translate(source_record(dml("d", None, Some(raw_row())), 1))
            .unwrap_err();
        assert!(err.to_string().starts_with("Found delete record does not have before"));
    }

    #[test]
    fn test_ddl_fan_out() {
        let (translator, history) = translator();
        let ddl = "ALTER TABLE t ADD COLUMN x INT, ADD COLUMN y INT";
        let value = RecordValue {
            ddl: Some(ddl.to_string()),
            source: SourceMetadata {
                ts_ms: 42,
                ..Default::default()
            },
            ..Default::default()
        };

        let events = translator.translate(source_record(value, 300)).unwrap();
        assert_eq!(events.len(), 2);
        for item in &events {
            assert_eq!(item.event.table(), "t");
            assert_eq!(item.event.reference_time(), 42);
            assert_eq!(item.position, events[0].position);
        }
        assert!(matches!(
            &events[1].event,
            ChangeEvent::SchemaChange {
                operation: SchemaOperation::AddColumn(column),
                ..
            } if column.name == "y"
        ));
        assert_eq!(history.history("t"), vec![ddl.to_string()]);
    }

    #[test]
    fn test_ddl_translation_failure_is_fatal() {
        let (translator, history) = translator();
        let value = RecordValue {
            ddl: Some("ALTER TABLE".to_string()),
            ..Default::default()
        };

        let err = translator.translate(source_record(value, 1)).unwrap_err();
        assert!(matches!(err, CdcError::DdlTranslation { ref ddl, .. } if ddl == "ALTER TABLE"));
        assert_eq!(history.table_count(), 0);
    }

    #[test]
    fn test_heartbeat_yields_nothing() {
        let (translator, _) = translator();
        assert!(translator.translate(SourceRecord::default()).unwrap().is_empty());
    }
}
