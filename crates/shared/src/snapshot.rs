//! Content-addressed snapshots for immutable records.
//!
//! A record is serialized to canonical JSON (sorted keys, compact, tagged with
//! its record name) and hashed with SHA-256. Equal records produce equal ids on
//! every machine; the same canonical text is what crosses process boundaries.

use crate::errors::{ErrorCode, ErrorEnvelope};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// Key holding the record name inside a serialized snapshot.
pub const RECORD_TAG: &str = "__record__";

/// Immutable record types allowed to be snapshotted and transmitted.
pub trait SnapshotRecord: Serialize {
    /// Stable record name embedded in the serialized payload.
    const RECORD_NAME: &'static str;
}

/// Deterministic identifier derived from a record's content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SnapshotId(Box<str>);

impl SnapshotId {
    /// Access the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SnapshotId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Snapshot encoding failures.
#[derive(Debug)]
pub enum SnapshotError {
    /// The record could not be encoded.
    Serialize {
        /// Record being encoded.
        record: &'static str,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// The record did not encode to a JSON object.
    NotAnObject {
        /// Record being encoded.
        record: &'static str,
    },
    /// The payload could not be decoded.
    Deserialize {
        /// Record being decoded.
        record: &'static str,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// The payload carries a different (or no) record tag.
    RecordMismatch {
        /// Record the caller asked for.
        expected: &'static str,
        /// Tag found in the payload, if any.
        found: Option<String>,
    },
}

impl SnapshotError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::Serialize { .. } | Self::NotAnObject { .. } => {
                ErrorCode::new("snapshot", "serialize")
            },
            Self::Deserialize { .. } => ErrorCode::new("snapshot", "deserialize"),
            Self::RecordMismatch { .. } => ErrorCode::new("snapshot", "record_mismatch"),
        }
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize { record, source } => {
                write!(formatter, "failed to serialize {record}: {source}")
            },
            Self::NotAnObject { record } => {
                write!(formatter, "{record} must serialize to a JSON object")
            },
            Self::Deserialize { record, source } => {
                write!(formatter, "failed to deserialize {record}: {source}")
            },
            Self::RecordMismatch { expected, found } => match found {
                Some(found) => write!(formatter, "expected record {expected}, found {found}"),
                None => write!(formatter, "expected record {expected}, found untagged payload"),
            },
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialize { source, .. } | Self::Deserialize { source, .. } => Some(source),
            Self::NotAnObject { .. } | Self::RecordMismatch { .. } => None,
        }
    }
}

impl From<SnapshotError> for ErrorEnvelope {
    fn from(error: SnapshotError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        match error {
            SnapshotError::Serialize { record, .. } | SnapshotError::NotAnObject { record } => {
                Self::invariant(code, message).with_metadata("record", record)
            },
            SnapshotError::Deserialize { record, .. } => {
                Self::expected(code, message).with_metadata("record", record)
            },
            SnapshotError::RecordMismatch { expected, found } => {
                let envelope = Self::expected(code, message).with_metadata("expected", expected);
                match found {
                    Some(found) => envelope.with_metadata("found", found),
                    None => envelope,
                }
            },
        }
    }
}

/// Serialize a record to its canonical tagged JSON form.
pub fn serialize_record<T: SnapshotRecord>(record: &T) -> Result<String, SnapshotError> {
    let value = serde_json::to_value(record).map_err(|source| SnapshotError::Serialize {
        record: T::RECORD_NAME,
        source,
    })?;
    let Value::Object(mut fields) = value else {
        return Err(SnapshotError::NotAnObject {
            record: T::RECORD_NAME,
        });
    };
    fields.insert(
        RECORD_TAG.to_owned(),
        Value::String(T::RECORD_NAME.to_owned()),
    );

    serde_json::to_string(&canonicalize(Value::Object(fields))).map_err(|source| {
        SnapshotError::Serialize {
            record: T::RECORD_NAME,
            source,
        }
    })
}

/// Decode a payload produced by [`serialize_record`].
pub fn deserialize_record<T>(payload: &str) -> Result<T, SnapshotError>
where
    T: SnapshotRecord + DeserializeOwned,
{
    let value: Value =
        serde_json::from_str(payload).map_err(|source| SnapshotError::Deserialize {
            record: T::RECORD_NAME,
            source,
        })?;
    let Value::Object(mut fields) = value else {
        return Err(SnapshotError::RecordMismatch {
            expected: T::RECORD_NAME,
            found: None,
        });
    };

    match fields.remove(RECORD_TAG) {
        Some(Value::String(tag)) if tag == T::RECORD_NAME => {},
        Some(other) => {
            return Err(SnapshotError::RecordMismatch {
                expected: T::RECORD_NAME,
                found: Some(other.as_str().map_or_else(|| other.to_string(), str::to_owned)),
            });
        },
        None => {
            return Err(SnapshotError::RecordMismatch {
                expected: T::RECORD_NAME,
                found: None,
            });
        },
    }

    serde_json::from_value(Value::Object(fields)).map_err(|source| SnapshotError::Deserialize {
        record: T::RECORD_NAME,
        source,
    })
}

/// Derive the snapshot id for a record.
pub fn create_snapshot_id<T: SnapshotRecord>(record: &T) -> Result<SnapshotId, SnapshotError> {
    let canonical = serialize_record(record)?;
    Ok(SnapshotId(hash_data(&canonical).into_boxed_str()))
}

// Object keys are re-inserted in sorted order so the encoding does not depend
// on the map implementation serde_json was built with.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(fields) => {
            let mut entries: Vec<(String, Value)> = fields.into_iter().collect();
            entries.sort_by(|left, right| left.0.cmp(&right.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        },
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

fn hash_data(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}
