//! Stream positions
//!
//! Every delivered event carries a [`StreamPosition`]: enough on its own to
//! resume reading right after that event. Its wire form is a single entry
//! mapping the serialized partition JSON to the serialized offset JSON.
//!
//! Callers that only know a binlog file name and byte offset start from a
//! [`BinlogPosition`], which converts one-way into the structured form once
//! the session identity and source server id are known:
//!
//! ```ignore
//! let pos = BinlogPosition::new("mysql-bin.000003", 154)
//!     .to_stream_position("7c9e6679-7425-40de-944b-e07fc1f90ae7", 1)?;
//! // partition: {"server":"7c9e..."}
//! // offset:    {"file":"mysql-bin.000003","pos":154,"server_id":1}
//! ```

use crate::common::{CdcError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Partition key holding the session identity.
pub const SERVER_PARTITION_KEY: &str = "server";
/// Offset key for the binlog file name.
pub const FILE_OFFSET_KEY: &str = "file";
/// Offset key for the byte position within the file.
pub const POS_OFFSET_KEY: &str = "pos";
/// Offset key for the source server id.
pub const SERVER_ID_OFFSET_KEY: &str = "server_id";

/// Coarse position: binlog file plus byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinlogPosition {
    pub filename: String,
    pub position: u64,
}

impl BinlogPosition {
    pub fn new(filename: impl Into<String>, position: u64) -> Self {
        Self {
            filename: filename.into(),
            position,
        }
    }

    /// Convert into the structured form for the given session identity.
    pub fn to_stream_position(
        &self,
        session_name: impl Into<String>,
        server_id: u32,
    ) -> Result<StreamPosition> {
        if self.filename.is_empty() {
            return Err(CdcError::invalid_position("binlog filename is empty"));
        }
        let session_name = session_name.into();

        let mut partition = Map::new();
        partition.insert(
            SERVER_PARTITION_KEY.to_string(),
            Value::String(session_name.clone()),
        );

        let mut offset = Map::new();
        offset.insert(
            FILE_OFFSET_KEY.to_string(),
            Value::String(self.filename.clone()),
        );
        offset.insert(POS_OFFSET_KEY.to_string(), Value::from(self.position));
        offset.insert(SERVER_ID_OFFSET_KEY.to_string(), Value::from(server_id));

        StreamPosition::from_source(session_name, &partition, &offset)
    }
}

impl fmt::Display for BinlogPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.position)
    }
}

/// Structured, resumable position.
///
/// `offset` maps serialized partition JSON to serialized offset JSON. Both
/// sides are flat JSON objects with primitive values; this is checked on
/// construction and on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStreamPosition")]
pub struct StreamPosition {
    name: String,
    offset: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct RawStreamPosition {
    name: String,
    offset: BTreeMap<String, String>,
}

impl TryFrom<RawStreamPosition> for StreamPosition {
    type Error = CdcError;

    fn try_from(raw: RawStreamPosition) -> Result<Self> {
        Self::new(raw.name, raw.offset)
    }
}

impl StreamPosition {
    /// Build from the wire form, validating every entry.
    pub fn new(name: impl Into<String>, offset: BTreeMap<String, String>) -> Result<Self> {
        if offset.is_empty() {
            return Err(CdcError::invalid_position("offset map is empty"));
        }
        for (partition, source_offset) in &offset {
            parse_flat_object("partition", partition)?;
            parse_flat_object("offset", source_offset)?;
        }
        Ok(Self {
            name: name.into(),
            offset,
        })
    }

    /// Build from one partition/offset pair as reported by the engine.
    pub fn from_source(
        name: impl Into<String>,
        partition: &Map<String, Value>,
        offset: &Map<String, Value>,
    ) -> Result<Self> {
        validate_flat_object("partition", partition)?;
        validate_flat_object("offset", offset)?;

        let mut wire = BTreeMap::new();
        wire.insert(
            serde_json::to_string(partition)?,
            serde_json::to_string(offset)?,
        );
        Ok(Self {
            name: name.into(),
            offset: wire,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire form: serialized partition to serialized offset.
    pub fn offset(&self) -> &BTreeMap<String, String> {
        &self.offset
    }

    /// Parsed partition/offset pairs.
    pub fn entries(&self) -> Result<Vec<(Map<String, Value>, Map<String, Value>)>> {
        self.offset
            .iter()
            .map(|(p, o)| Ok((parse_flat_object("partition", p)?, parse_flat_object("offset", o)?)))
            .collect()
    }

    /// Recover the coarse binlog position when the offset carries one.
    pub fn binlog_position(&self) -> Option<BinlogPosition> {
        let entries = self.entries().ok()?;
        let (_, offset) = entries.first()?;
        let filename = offset.get(FILE_OFFSET_KEY)?.as_str()?;
        let position = offset.get(POS_OFFSET_KEY)?.as_u64()?;
        Some(BinlogPosition::new(filename, position))
    }

    /// Serialized wire form, as handed to the engine.
    pub fn to_wire_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.offset)?)
    }
}

impl fmt::Display for StreamPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (partition, offset) in &self.offset {
            write!(f, " {}={}", partition, offset)?;
        }
        Ok(())
    }
}

/// Where a session starts reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartPosition {
    Binlog(BinlogPosition),
    Stream(StreamPosition),
}

impl StartPosition {
    /// Resolve to the structured form; coarse positions take the session
    /// identity and source server id.
    pub fn into_stream_position(self, session_name: &str, server_id: u32) -> Result<StreamPosition> {
        match self {
            StartPosition::Binlog(pos) => pos.to_stream_position(session_name, server_id),
            StartPosition::Stream(pos) => Ok(pos),
        }
    }
}

impl From<BinlogPosition> for StartPosition {
    fn from(pos: BinlogPosition) -> Self {
        StartPosition::Binlog(pos)
    }
}

impl From<StreamPosition> for StartPosition {
    fn from(pos: StreamPosition) -> Self {
        StartPosition::Stream(pos)
    }
}

fn validate_flat_object(what: &str, object: &Map<String, Value>) -> Result<()> {
    if object.is_empty() {
        return Err(CdcError::invalid_position(format!("{} is empty", what)));
    }
    match object
        .iter()
        .find(|(_, v)| matches!(v, Value::Object(_) | Value::Array(_)))
    {
        Some((key, _)) => Err(CdcError::invalid_position(format!(
            "{} value for '{}' is not a primitive",
            what, key
        ))),
        None => Ok(()),
    }
}

fn parse_flat_object(what: &str, text: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CdcError::invalid_position(format!("{} is not JSON: {}", what, e)))?;
    match value {
        Value::Object(object) => {
            validate_flat_object(what, &object)?;
            Ok(object)
        }
        other => Err(CdcError::invalid_position(format!(
            "{} is not a JSON object: {}",
            what, other
        ))),
    }
}
