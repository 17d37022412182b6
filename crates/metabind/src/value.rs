//! The in-memory object graph.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::classify::MemberKind;

/// A parsed scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    String(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    /// Normalized markup text (escaped character data plus inline elements).
    Markup(String),
}

impl ScalarValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) | ScalarValue::Markup(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::String(s) | ScalarValue::Markup(s) => f.write_str(s),
            ScalarValue::Integer(i) => write!(f, "{i}"),
            ScalarValue::Decimal(d) => write!(f, "{d}"),
            ScalarValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::String(s)
    }
}

impl From<i64> for ScalarValue {
    fn from(i: i64) -> Self {
        ScalarValue::Integer(i)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Boolean(b)
    }
}

/// One item of a property: a scalar or a nested object.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundItem {
    Scalar(ScalarValue),
    Object(BoundObject),
}

impl BoundItem {
    pub fn string(s: impl Into<String>) -> Self {
        BoundItem::Scalar(ScalarValue::String(s.into()))
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            BoundItem::Scalar(v) => Some(v),
            BoundItem::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&BoundObject> {
        match self {
            BoundItem::Object(o) => Some(o),
            BoundItem::Scalar(_) => None,
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            BoundItem::Scalar(_) => "a scalar",
            BoundItem::Object(_) => "an object",
        }
    }
}

impl From<ScalarValue> for BoundItem {
    fn from(v: ScalarValue) -> Self {
        BoundItem::Scalar(v)
    }
}

impl From<BoundObject> for BoundItem {
    fn from(o: BoundObject) -> Self {
        BoundItem::Object(o)
    }
}

/// The value held by one member slot, shaped by the property's cardinality.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberValue {
    Single(BoundItem),
    List(Vec<BoundItem>),
    Map(IndexMap<String, BoundItem>),
}

impl MemberValue {
    pub fn is_empty(&self) -> bool {
        match self {
            MemberValue::Single(_) => false,
            MemberValue::List(items) => items.is_empty(),
            MemberValue::Map(entries) => entries.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MemberValue::Single(_) => 1,
            MemberValue::List(items) => items.len(),
            MemberValue::Map(entries) => entries.len(),
        }
    }

    pub fn member_kind(&self) -> MemberKind {
        match self {
            MemberValue::Single(_) => MemberKind::Value,
            MemberValue::List(_) => MemberKind::Sequence,
            MemberValue::Map(_) => MemberKind::Associative,
        }
    }

    pub fn as_single(&self) -> Option<&BoundItem> {
        match self {
            MemberValue::Single(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[BoundItem]> {
        match self {
            MemberValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, BoundItem>> {
        match self {
            MemberValue::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// An instance of a bound class.
///
/// Members live in slots whose indices are fixed when the class is bound;
/// use [`crate::ClassBinding`] to address them by name.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundObject {
    class: Arc<str>,
    slots: Vec<Option<MemberValue>>,
    value: Option<ScalarValue>,
}

impl BoundObject {
    pub(crate) fn new(class: Arc<str>, slot_count: usize) -> Self {
        Self {
            class,
            slots: vec![None; slot_count],
            value: None,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class
    }

    pub fn slot(&self, index: usize) -> Option<&MemberValue> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn set_slot(&mut self, index: usize, value: Option<MemberValue>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = value;
        }
    }

    /// The scalar content of a field-class instance.
    pub fn value(&self) -> Option<&ScalarValue> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: Option<ScalarValue>) {
        self.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_value_lengths() {
        assert_eq!(MemberValue::Single(BoundItem::string("a")).len(), 1);
        assert!(MemberValue::List(vec![]).is_empty());
        let mut map = IndexMap::new();
        map.insert("k".to_string(), BoundItem::string("v"));
        assert_eq!(MemberValue::Map(map).len(), 1);
    }

    #[test]
    fn out_of_range_slots_are_ignored() {
        let mut obj = BoundObject::new(Arc::from("c"), 1);
        obj.set_slot(3, Some(MemberValue::Single(BoundItem::string("x"))));
        assert_eq!(obj.slot(3), None);
        obj.set_slot(0, Some(MemberValue::Single(BoundItem::string("x"))));
        assert!(obj.slot(0).is_some());
    }
}
