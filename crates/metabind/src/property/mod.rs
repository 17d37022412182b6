//! Bound properties and their shape metadata.

mod bound;
mod info;

pub use bound::BoundProperty;
pub use info::PropertyInfo;
