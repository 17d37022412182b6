//! Key/value (JSON) token stream.
//!
//! Unlike `serde_json::Value`, the reader reports every field name in
//! document order, so duplicate keys reach the consumer and the consumer
//! decides how to resolve them.

mod reader;
mod writer;

pub use reader::JsonReader;
pub use writer::JsonWriter;

use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum JsonToken {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName(String),
    /// A string, number, boolean or null leaf.
    Scalar(Value),
}

impl fmt::Display for JsonToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonToken::StartObject => f.write_str("`{`"),
            JsonToken::EndObject => f.write_str("`}`"),
            JsonToken::StartArray => f.write_str("`[`"),
            JsonToken::EndArray => f.write_str("`]`"),
            JsonToken::FieldName(name) => write!(f, "field {name:?}"),
            JsonToken::Scalar(value) => write!(f, "value {value}"),
        }
    }
}

/// Describe an optional token for diagnostics.
pub fn describe(token: Option<&JsonToken>) -> String {
    match token {
        Some(token) => token.to_string(),
        None => "end of input".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonError {
    #[error("invalid JSON at byte {0}")]
    Invalid(usize),
    #[error("invalid UTF-8 in string at byte {0}")]
    InvalidUtf8(usize),
    #[error("unexpected end of JSON input")]
    UnexpectedEnd,
    #[error("expected {expected} at byte {position}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },
    #[error("JSON write failed: {0}")]
    Write(String),
}
