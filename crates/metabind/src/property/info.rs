use crate::classify::{classify_definition, Shape};
use crate::collector::PropertyCollector;
use crate::definition::{JsonGroupAs, PropertyDefinition};
use crate::error::BindError;
use crate::value::MemberValue;

/// Shape-specific metadata of a bound property.
///
/// The read/write algorithms for each document format live next to their
/// codecs (`codec::markup`, `codec::json`) as further `impl PropertyInfo`
/// blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyInfo {
    Singleton,
    /// `json` selects array vs bare-item output in key/value documents.
    List { json: JsonGroupAs },
    Map,
}

impl PropertyInfo {
    pub fn for_definition(definition: &PropertyDefinition) -> Result<Self, BindError> {
        Ok(match classify_definition(definition)? {
            Shape::Singleton => PropertyInfo::Singleton,
            Shape::List => PropertyInfo::List {
                json: definition.json_group(),
            },
            Shape::Map => PropertyInfo::Map,
        })
    }

    pub fn shape(&self) -> Shape {
        match self {
            PropertyInfo::Singleton => Shape::Singleton,
            PropertyInfo::List { .. } => Shape::List,
            PropertyInfo::Map => Shape::Map,
        }
    }

    pub fn new_collector(&self) -> PropertyCollector {
        PropertyCollector::new(self.shape())
    }

    /// True when `value` would produce output on write.
    pub fn is_value_set(&self, value: Option<&MemberValue>) -> bool {
        value.is_some_and(|v| !v.is_empty())
    }

    /// Check that a value has the container this shape requires.
    pub(crate) fn accepts(&self, value: &MemberValue) -> bool {
        matches!(
            (self, value),
            (PropertyInfo::Singleton, MemberValue::Single(_))
                | (PropertyInfo::List { .. }, MemberValue::List(_))
                | (PropertyInfo::Map, MemberValue::Map(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{GroupAs, MaxOccurs};

    #[test]
    fn carries_json_grouping_for_lists() {
        let def = PropertyDefinition::field("tag", "string")
            .occurs(0, MaxOccurs::Unbounded)
            .group_as(GroupAs::new("tags").json(JsonGroupAs::SingletonOrList));
        assert_eq!(
            PropertyInfo::for_definition(&def),
            Ok(PropertyInfo::List {
                json: JsonGroupAs::SingletonOrList
            })
        );
    }

    #[test]
    fn empty_list_is_not_set() {
        let info = PropertyInfo::List {
            json: JsonGroupAs::List,
        };
        assert!(!info.is_value_set(None));
        assert!(!info.is_value_set(Some(&MemberValue::List(vec![]))));
    }
}
