//! Per-read accumulators.
//!
//! A collector lives for one property read: the codec adds 0..N items and
//! the caller commits [`PropertyCollector::into_value`] to the instance once.
//! Nothing reaches the instance if the read fails part way.

use indexmap::IndexMap;

use crate::classify::Shape;
use crate::value::{BoundItem, MemberValue};

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyCollector {
    Singleton(Option<BoundItem>),
    List(Vec<BoundItem>),
    Map(IndexMap<String, BoundItem>),
}

impl PropertyCollector {
    pub fn new(shape: Shape) -> Self {
        match shape {
            Shape::Singleton => PropertyCollector::Singleton(None),
            Shape::List => PropertyCollector::List(Vec::new()),
            Shape::Map => PropertyCollector::Map(IndexMap::new()),
        }
    }

    /// Add an unkeyed item. A singleton keeps the latest item, a list
    /// appends (duplicates included). A map keys the item by its
    /// insertion index; keyed reads go through [`Self::add_keyed`].
    pub fn add(&mut self, item: BoundItem) {
        match self {
            PropertyCollector::Singleton(slot) => *slot = Some(item),
            PropertyCollector::List(items) => items.push(item),
            PropertyCollector::Map(entries) => {
                let key = entries.len().to_string();
                entries.insert(key, item);
            }
        }
    }

    /// Add a keyed item. On a map a repeated key replaces the earlier value
    /// and keeps the earlier position. Other shapes ignore the key.
    pub fn add_keyed(&mut self, key: String, item: BoundItem) {
        match self {
            PropertyCollector::Map(entries) => {
                entries.insert(key, item);
            }
            _ => self.add(item),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PropertyCollector::Singleton(slot) => usize::from(slot.is_some()),
            PropertyCollector::List(items) => items.len(),
            PropertyCollector::Map(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The finalized member value; `None` when nothing was collected.
    pub fn into_value(self) -> Option<MemberValue> {
        match self {
            PropertyCollector::Singleton(slot) => slot.map(MemberValue::Single),
            PropertyCollector::List(items) if items.is_empty() => None,
            PropertyCollector::List(items) => Some(MemberValue::List(items)),
            PropertyCollector::Map(entries) if entries.is_empty() => None,
            PropertyCollector::Map(entries) => Some(MemberValue::Map(entries)),
        }
    }
}
