//! Document codecs. Each format adds its read/write algorithms to
//! [`crate::PropertyInfo`], [`crate::DataTypeHandler`] and
//! [`crate::ClassBinding`].

pub mod json;
pub mod markup;

pub use json::{JsonReadContext, JsonWriteContext};
pub use markup::{MarkupReadContext, MarkupWriteContext};
