//! Snapshot row reading
//!
//! Initial and filtered table reads walk a [`RowCursor`] row by row, turning
//! each row into a column to value map. Offset-tracking reads also record
//! the primary-key values of the last row seen, so an interrupted snapshot
//! can resume after it.
//!
//! A failure while reading a column aborts the read with
//! [`CdcError::ColumnRead`], which carries the 1-based row number, the
//! column name and the columns read so far.

use crate::common::{BoxError, CdcError, FieldValue, Result, Row};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Forward-only cursor over a query result.
#[async_trait]
pub trait RowCursor: Send {
    /// Column names, in result order.
    fn columns(&self) -> &[String];

    /// Move to the next row. Returns false past the last row.
    async fn advance(&mut self) -> std::result::Result<bool, BoxError>;

    /// Read column `index` of the current row.
    fn read(&mut self, index: usize) -> std::result::Result<FieldValue, BoxError>;
}

/// Resume point of a table snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotOffset {
    pub table: String,
    /// Primary-key values of the last row read
    #[serde(default)]
    pub offset: BTreeMap<String, FieldValue>,
}

impl SnapshotOffset {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            offset: BTreeMap::new(),
        }
    }

    pub fn is_initial(&self) -> bool {
        self.offset.is_empty()
    }
}

/// Read every row, tracking primary-key values in `offset`.
///
/// `stop` is checked before each row. `consumer` sees each row together with
/// the offset as of that row. Returns the number of rows read.
pub async fn read_with_offset<C, S, F>(
    cursor: &mut C,
    primary_keys: &[String],
    offset: &mut SnapshotOffset,
    stop: S,
    mut consumer: F,
) -> Result<u64>
where
    C: RowCursor + ?Sized,
    S: Fn() -> bool,
    F: FnMut(Row, &SnapshotOffset) -> Result<()>,
{
    let columns = cursor.columns().to_vec();
    let mut rows = 0u64;

    while !stop() && cursor.advance().await.map_err(read_failure(rows + 1))? {
        rows += 1;
        let mut data = Row::new();
        for (index, column) in columns.iter().enumerate() {
            let value = match cursor.read(index) {
                Ok(value) => value,
                Err(e) => return Err(CdcError::column_read(rows, column.clone(), data, e)),
            };
            if primary_keys.contains(column) {
                offset.offset.insert(column.clone(), value.clone());
            }
            data.insert(column.clone(), value);
        }
        consumer(data, offset)?;
    }

    debug!("Read {} rows from {}", rows, offset.table);
    Ok(rows)
}

/// Read every row matching the cursor's query.
///
/// `stop` is checked after moving to each row, so a stop request discards
/// the row just fetched. Returns the number of rows delivered.
pub async fn read_with_filter<C, S, F>(cursor: &mut C, stop: S, mut consumer: F) -> Result<u64>
where
    C: RowCursor + ?Sized,
    S: Fn() -> bool,
    F: FnMut(Row) -> Result<()>,
{
    let columns = cursor.columns().to_vec();
    let mut rows = 0u64;

    while cursor.advance().await.map_err(read_failure(rows + 1))? {
        if stop() {
            break;
        }
        rows += 1;
        let mut data = Row::new();
        for (index, column) in columns.iter().enumerate() {
            match cursor.read(index) {
                Ok(value) => {
                    data.insert(column.clone(), value);
                }
                Err(e) => return Err(CdcError::column_read(rows, column.clone(), data, e)),
            }
        }
        consumer(data)?;
    }

    Ok(rows)
}

fn read_failure(row: u64) -> impl FnOnce(BoxError) -> CdcError {
    move |e| CdcError::other(format!("Fetching row {} failed: {}", row, e))
}
