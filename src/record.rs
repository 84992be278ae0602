//! Record and document types shared by every command.
//!
//! A document on disk is either a bare JSON list of records or an object
//! carrying the list under `skills`. The shape is captured once at parse
//! time so writers can restore it without sniffing again.

use serde_json::{Map, Value};
use thiserror::Error;

/// A single skill/plugin record. Fields other than `name`, `id` and
/// `_legacy_id` are carried through untouched.
pub type Record = Map<String, Value>;

pub const SKILLS_KEY: &str = "skills";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("expected a list of records or an object with a `skills` list, got {0}")]
    UnexpectedTopLevel(&'static str),
    #[error("`skills` must be a list, got {0}")]
    SkillsNotAList(&'static str),
    #[error("entry {index} is not a record object (got {kind})")]
    NotARecord { index: usize, kind: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    List,
    /// The enclosing object minus its `skills` field, and the position
    /// `skills` held among the object's keys.
    Wrapped {
        envelope: Map<String, Value>,
        skills_at: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordDocument {
    pub records: Vec<Record>,
    shape: Shape,
}

impl RecordDocument {
    pub fn list(records: Vec<Record>) -> Self {
        Self {
            records,
            shape: Shape::List,
        }
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self.shape, Shape::Wrapped { .. })
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Array(items) => Ok(Self::list(records_from(items)?)),
            Value::Object(mut envelope) => {
                let skills_at = envelope
                    .keys()
                    .position(|k| k == SKILLS_KEY)
                    .unwrap_or(envelope.len());
                let records = match envelope.shift_remove(SKILLS_KEY) {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => records_from(items)?,
                    Some(other) => return Err(DocumentError::SkillsNotAList(kind_of(&other))),
                };
                Ok(Self {
                    records,
                    shape: Shape::Wrapped {
                        envelope,
                        skills_at,
                    },
                })
            }
            other => Err(DocumentError::UnexpectedTopLevel(kind_of(&other))),
        }
    }

    /// Rebuild the JSON value in the shape the document was read with.
    pub fn into_value(self) -> Value {
        let records = Value::Array(self.records.into_iter().map(Value::Object).collect());
        match self.shape {
            Shape::List => records,
            Shape::Wrapped {
                envelope,
                skills_at,
            } => {
                let mut out = Map::new();
                let mut records = Some(records);
                for (index, (key, value)) in envelope.into_iter().enumerate() {
                    if index == skills_at {
                        if let Some(records) = records.take() {
                            out.insert(SKILLS_KEY.to_string(), records);
                        }
                    }
                    out.insert(key, value);
                }
                if let Some(records) = records {
                    out.insert(SKILLS_KEY.to_string(), records);
                }
                Value::Object(out)
            }
        }
    }
}

/// Convert a list of JSON values into records, failing on the first
/// entry that is not an object.
pub fn records_from(items: Vec<Value>) -> Result<Vec<Record>, DocumentError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(DocumentError::NotARecord {
                index,
                kind: kind_of(&other),
            }),
        })
        .collect()
}

/// The record's `id` if it is a string.
pub fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
