//! Error types.
//!
//! - [`BindError`]: configuration problems found when a property or class is
//!   bound. Deterministic, so they are memoized alongside the metadata.
//! - [`DocumentError`]: the document does not have the expected structure.
//! - [`ValueError`]: a scalar adapter rejected some content.
//! - [`CodecError`]: what a read or write call returns.

use metabind_io::{JsonError, MarkupError};

use crate::classify::{MemberKind, Shape};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("property `{property}`: {shape} cardinality needs a {expected} member, found {found}")]
    IncompatibleCardinality {
        property: String,
        shape: Shape,
        expected: MemberKind,
        found: MemberKind,
    },
    #[error("property `{property}`: unresolved value type `{type_name}`")]
    UnresolvedValueType { property: String, type_name: String },
    #[error("unknown class `{0}`")]
    UnknownClass(String),
    #[error("class `{0}` has no root name")]
    NotARoot(String),
    #[error("class `{class}` designates unknown flag `{flag}` as its {role}")]
    UnknownFlag {
        class: String,
        flag: String,
        role: &'static str,
    },
    #[error("keyed property `{property}` holds class `{class}`, which has no json key flag")]
    MissingJsonKey { property: String, class: String },
    #[error("field class `{0}` declares no field value")]
    MissingFieldValue(String),
    #[error("class `{class}` has no property `{property}`")]
    UnknownProperty { class: String, property: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Markup(#[from] MarkupError),
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error("expected field `{expected}` at byte {position}, found {found}")]
    ExpectedField {
        expected: String,
        found: String,
        position: usize,
    },
    #[error("unknown field `{name}` at byte {position}")]
    UnknownField { name: String, position: usize },
    #[error("unexpected {found} inside <{parent}> at byte {position}")]
    UnexpectedContent {
        parent: String,
        found: String,
        position: usize,
    },
    #[error("item of `{property}` has no key at byte {position}")]
    MissingKey { property: String, position: usize },
    #[error("expected {expected} for `{name}` at byte {position}, found {found}")]
    UnexpectedToken {
        name: String,
        expected: &'static str,
        found: String,
        position: usize,
    },
}

/// A scalar adapter rejected some content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {adapter} value {text:?}: {reason}")]
pub struct ValueError {
    pub adapter: String,
    pub text: String,
    pub reason: String,
}

impl ValueError {
    pub fn new(adapter: &str, text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            adapter: adapter.to_string(),
            text: text.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Configuration(#[from] BindError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("`{name}` at byte {position}: {source}")]
    Value {
        source: ValueError,
        name: String,
        position: usize,
    },
    #[error("`{name}`: {source}")]
    Serialize { source: ValueError, name: String },
    #[error("expected an instance of `{expected}`, found `{found}`")]
    WrongClass { expected: String, found: String },
    #[error("class `{class}` keys its value by flag `{flag}`, which is not set")]
    MissingValueKey { class: String, flag: String },
    #[error("`{property}` holds {found} but its value type is {expected}")]
    ItemMismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl From<MarkupError> for CodecError {
    fn from(err: MarkupError) -> Self {
        CodecError::Document(DocumentError::Markup(err))
    }
}

impl From<JsonError> for CodecError {
    fn from(err: JsonError) -> Self {
        CodecError::Document(DocumentError::Json(err))
    }
}

impl CodecError {
    /// Attach the property name and position to an adapter failure.
    pub fn value(source: ValueError, name: &str, position: usize) -> Self {
        CodecError::Value {
            source,
            name: name.to_string(),
            position,
        }
    }

    /// Attach the property name to an adapter failure on write.
    pub fn serialize(source: ValueError, name: &str) -> Self {
        CodecError::Serialize {
            source,
            name: name.to_string(),
        }
    }
}
