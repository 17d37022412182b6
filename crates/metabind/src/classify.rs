//! Property classification: which cardinality shape a property binds to.

use std::fmt;

use crate::definition::{MaxOccurs, PropertyDefinition};
use crate::error::BindError;

/// The container a host declares for a property's member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// The item type itself.
    Value,
    /// An ordered sequence of items.
    Sequence,
    /// A string-keyed, insertion-ordered map of items.
    Associative,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberKind::Value => "plain value",
            MemberKind::Sequence => "sequence",
            MemberKind::Associative => "associative",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Singleton,
    List,
    Map,
}

impl Shape {
    /// The member container this shape requires.
    pub fn member_kind(self) -> MemberKind {
        match self {
            Shape::Singleton => MemberKind::Value,
            Shape::List => MemberKind::Sequence,
            Shape::Map => MemberKind::Associative,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Shape::Singleton => "singleton",
            Shape::List => "list",
            Shape::Map => "map",
        })
    }
}

/// The shape implied by occurrence and grouping alone.
pub fn shape_of(max_occurs: Option<MaxOccurs>, keyed: bool) -> Shape {
    if keyed {
        Shape::Map
    } else if max_occurs.is_some_and(MaxOccurs::is_multiple) {
        Shape::List
    } else {
        Shape::Singleton
    }
}

/// Classify a property given the member container its host declares.
///
/// Pure: equal inputs always give equal results.
pub fn classify(
    property: &str,
    member: MemberKind,
    max_occurs: Option<MaxOccurs>,
    keyed: bool,
) -> Result<Shape, BindError> {
    let shape = shape_of(max_occurs, keyed);
    let expected = shape.member_kind();
    if member != expected {
        return Err(BindError::IncompatibleCardinality {
            property: property.to_string(),
            shape,
            expected,
            found: member,
        });
    }
    Ok(shape)
}

/// Classify a definition, deriving the member container when undeclared.
pub fn classify_definition(definition: &PropertyDefinition) -> Result<Shape, BindError> {
    let keyed = definition.is_keyed();
    let member = definition
        .member
        .unwrap_or_else(|| shape_of(definition.max_occurs, keyed).member_kind());
    classify(&definition.name, member, definition.max_occurs, keyed)
}
