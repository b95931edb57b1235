//! Row value coercion
//!
//! Converts raw engine values into [`FieldValue`]s, normalizing temporal
//! columns according to the catalog's view of the column:
//!
//! | Column type | Raw value | Result |
//! |---|---|---|
//! | datetime, fraction 0 | integer millis | integer seconds (`ms / 1000`) |
//! | datetime, any fraction | ISO-8601 string | instant (string kept on parse failure) |
//! | date | integer day count | millis since epoch (`days * 86_400_000`) |
//!
//! Everything else, including columns the catalog does not know, passes
//! through with only the representation change.

use crate::common::{FieldType, FieldValue, RawRow, RawValue, Row, TableCatalog};
use chrono::{DateTime, Utc};

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Convert a whole row image of `table`.
pub fn convert_row(table: &str, raw: RawRow, catalog: &dyn TableCatalog) -> Row {
    let schema = catalog.table(table);
    raw.into_iter()
        .map(|(column, value)| {
            let field_type = schema.as_ref().and_then(|s| s.field(&column));
            let value = coerce_value(field_type, value);
            (column, value)
        })
        .collect()
}

/// Convert one value given the column's logical type, if known.
pub fn coerce_value(field_type: Option<&FieldType>, value: RawValue) -> FieldValue {
    match (field_type, value) {
        (Some(FieldType::DateTime { fraction: 0 }), value @ (RawValue::Int32(_) | RawValue::Int64(_))) => {
            match value.as_integer() {
                Some(millis) => FieldValue::Int(millis / MILLIS_PER_SECOND),
                None => plain(value),
            }
        }
        (Some(FieldType::DateTime { .. }), RawValue::String(text)) => match parse_instant(&text) {
            Some(instant) => FieldValue::Instant(instant),
            None => FieldValue::String(text),
        },
        (Some(FieldType::Date), value @ (RawValue::Int32(_) | RawValue::Int64(_))) => {
            match value.as_integer() {
                Some(days) => FieldValue::Int(days.saturating_mul(MILLIS_PER_DAY)),
                None => plain(value),
            }
        }
        (_, value) => plain(value),
    }
}

fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn plain(value: RawValue) -> FieldValue {
    match value {
        RawValue::Null => FieldValue::Null,
        RawValue::Boolean(v) => FieldValue::Bool(v),
        RawValue::Int32(v) => FieldValue::Int(i64::from(v)),
        RawValue::Int64(v) => FieldValue::Int(v),
        RawValue::Float64(v) => FieldValue::Float(v),
        RawValue::Decimal(v) => FieldValue::Decimal(v),
        RawValue::String(v) => FieldValue::String(v),
        RawValue::Bytes(v) => FieldValue::Bytes(v),
        RawValue::Json(v) => FieldValue::Json(v),
    }
}
