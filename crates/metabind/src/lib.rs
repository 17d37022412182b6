//! Schema-driven document binding.
//!
//! Class definitions describe flags, fields and assemblies with their
//! occurrence and grouping rules. A [`BindingContext`] binds them to
//! [`BoundObject`] slots and translates instances to and from two document
//! formats: markup elements and key/value (JSON) objects.
//!
//! Per property, binding derives:
//!
//! - a [`PropertyInfo`] shape (singleton, list or keyed map) from the
//!   [`classify`] rules, and
//! - a [`DataTypeHandler`]: a [`ScalarAdapter`] or a nested [`ClassBinding`].
//!
//! Both are computed once and shared by every instance.
//!
//! # Example
//!
//! ```
//! use metabind::{BindingContext, ClassDefinition, GroupAs, MaxOccurs, PropertyDefinition};
//!
//! let ctx = BindingContext::new().with_class(
//!     ClassDefinition::assembly("doc").root("doc").with_property(
//!         PropertyDefinition::field("tag", "string")
//!             .occurs(0, MaxOccurs::Unbounded)
//!             .group_as(GroupAs::new("tags").grouped()),
//!     ),
//! );
//! let doc = ctx.read_xml("doc", "<doc><tags><tag>a</tag><tag>b</tag></tags></doc>").unwrap();
//! let json = ctx.write_json(&doc).unwrap();
//! assert_eq!(json, r#"{"doc":{"tags":["a","b"]}}"#);
//! ```

mod adapter;
mod binding;
pub mod classify;
pub mod codec;
mod collector;
mod context;
mod definition;
mod error;
mod handler;
mod options;
mod property;
mod value;

pub use adapter::{
    AdapterRegistry, BooleanAdapter, DecimalAdapter, IntegerAdapter, MarkupContent,
    MarkupLineAdapter, MarkupMultilineAdapter, NonNegativeIntegerAdapter, ScalarAdapter,
    StringAdapter, TokenAdapter,
};
pub use binding::ClassBinding;
pub use classify::{classify, MemberKind, Shape};
pub use collector::PropertyCollector;
pub use context::BindingContext;
pub use definition::{
    ClassDefinition, ClassKind, FieldValueDefinition, GroupAs, JsonGroupAs, JsonValueKey,
    MaxOccurs, PropertyDefinition, PropertyKind, ValueType, XmlGroupAs,
};
pub use error::{BindError, CodecError, DocumentError, ValueError};
pub use handler::DataTypeHandler;
pub use metabind_io::QName;
pub use options::{BindingOptions, ReadOptions, UnknownFields, WriteOptions};
pub use property::{BoundProperty, PropertyInfo};
pub use value::{BoundItem, BoundObject, MemberValue, ScalarValue};
