//! Class bindings: a class definition resolved against member slots.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::{AdapterRegistry, ScalarAdapter};
use crate::context::BindingContext;
use crate::definition::{ClassDefinition, ClassKind, JsonValueKey};
use crate::error::{BindError, CodecError};
use crate::handler::DataTypeHandler;
use crate::property::BoundProperty;
use crate::value::{BoundItem, BoundObject, MemberValue, ScalarValue};

/// How a field class labels its value in key/value documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValueKey {
    Fixed(String),
    /// Index into the flags.
    Flag(usize),
}

#[derive(Debug)]
pub(crate) struct FieldValue {
    pub(crate) adapter: Arc<dyn ScalarAdapter>,
    pub(crate) key: ValueKey,
}

/// A bound class. Flags occupy the first slots of an instance, followed by
/// the model properties in declaration order.
#[derive(Debug)]
pub struct ClassBinding {
    definition: Arc<ClassDefinition>,
    class: Arc<str>,
    flags: Vec<BoundProperty>,
    model: Vec<BoundProperty>,
    by_name: HashMap<String, usize>,
    by_json_name: HashMap<String, usize>,
    json_key: Option<usize>,
    field_value: Option<FieldValue>,
}

fn flag_index(
    definition: &ClassDefinition,
    flag: &str,
    role: &'static str,
) -> Result<usize, BindError> {
    definition
        .flags
        .iter()
        .position(|f| f.name == flag)
        .ok_or_else(|| BindError::UnknownFlag {
            class: definition.name.clone(),
            flag: flag.to_string(),
            role,
        })
}

impl ClassBinding {
    pub(crate) fn new(
        definition: Arc<ClassDefinition>,
        adapters: &AdapterRegistry,
    ) -> Result<Self, BindError> {
        let ns = definition.namespace.as_deref();
        let flags: Vec<BoundProperty> = definition
            .flags
            .iter()
            .enumerate()
            .map(|(slot, def)| BoundProperty::new(def.clone(), slot, ns))
            .collect();
        let model: Vec<BoundProperty> = definition
            .model
            .iter()
            .enumerate()
            .map(|(i, def)| BoundProperty::new(def.clone(), flags.len() + i, ns))
            .collect();

        let mut by_name = HashMap::new();
        let mut by_json_name = HashMap::new();
        for (index, property) in flags.iter().chain(model.iter()).enumerate() {
            by_name.entry(property.name().to_string()).or_insert(index);
            by_json_name
                .entry(property.json_name().to_string())
                .or_insert(index);
        }

        let json_key = definition
            .json_key
            .as_deref()
            .map(|flag| flag_index(&definition, flag, "json key"))
            .transpose()?;

        let field_value = match (&definition.kind, &definition.field_value) {
            (ClassKind::Assembly, _) => None,
            (ClassKind::Field, None) => {
                return Err(BindError::MissingFieldValue(definition.name.clone()))
            }
            (ClassKind::Field, Some(value)) => {
                let adapter = adapters.get(&value.adapter).cloned().ok_or_else(|| {
                    BindError::UnresolvedValueType {
                        property: definition.name.clone(),
                        type_name: value.adapter.clone(),
                    }
                })?;
                let key = match &value.json_value_key {
                    JsonValueKey::Default => {
                        ValueKey::Fixed(adapter.default_json_value_key().to_string())
                    }
                    JsonValueKey::Fixed(key) => ValueKey::Fixed(key.clone()),
                    JsonValueKey::Flag(flag) => {
                        ValueKey::Flag(flag_index(&definition, flag, "json value key")?)
                    }
                };
                Some(FieldValue { adapter, key })
            }
        };

        tracing::debug!(
            class = %definition.name,
            flags = flags.len(),
            properties = model.len(),
            "bound class"
        );
        Ok(Self {
            class: Arc::from(definition.name.as_str()),
            definition,
            flags,
            model,
            by_name,
            by_json_name,
            json_key,
            field_value,
        })
    }

    pub fn name(&self) -> &str {
        &self.class
    }

    pub fn definition(&self) -> &ClassDefinition {
        &self.definition
    }

    pub fn flags(&self) -> &[BoundProperty] {
        &self.flags
    }

    pub fn model(&self) -> &[BoundProperty] {
        &self.model
    }

    /// Flags, then model properties.
    pub fn properties(&self) -> impl Iterator<Item = &BoundProperty> {
        self.flags.iter().chain(self.model.iter())
    }

    fn by_index(&self, index: usize) -> Option<&BoundProperty> {
        match index.checked_sub(self.flags.len()) {
            None => self.flags.get(index),
            Some(i) => self.model.get(i),
        }
    }

    pub fn property(&self, name: &str) -> Option<&BoundProperty> {
        self.by_name.get(name).and_then(|&i| self.by_index(i))
    }

    /// The property written under `name` in key/value documents.
    pub fn json_property(&self, name: &str) -> Option<&BoundProperty> {
        self.by_json_name.get(name).and_then(|&i| self.by_index(i))
    }

    /// The flag whose value keys instances inside a keyed collection.
    pub fn json_key_flag(&self) -> Option<&BoundProperty> {
        self.json_key.and_then(|i| self.flags.get(i))
    }

    pub(crate) fn json_key_index(&self) -> Option<usize> {
        self.json_key
    }

    pub(crate) fn field_value(&self) -> Option<&FieldValue> {
        self.field_value.as_ref()
    }

    pub fn new_instance(&self) -> BoundObject {
        BoundObject::new(Arc::clone(&self.class), self.flags.len() + self.model.len())
    }

    pub(crate) fn check_instance(&self, object: &BoundObject) -> Result<(), CodecError> {
        if object.class_name() != self.name() {
            return Err(CodecError::WrongClass {
                expected: self.name().to_string(),
                found: object.class_name().to_string(),
            });
        }
        Ok(())
    }

    pub fn get<'o>(
        &self,
        object: &'o BoundObject,
        property: &str,
    ) -> Result<Option<&'o MemberValue>, BindError> {
        Ok(self.require(property)?.get(object))
    }

    pub fn set(
        &self,
        object: &mut BoundObject,
        property: &str,
        value: Option<MemberValue>,
    ) -> Result<(), BindError> {
        self.require(property)?.set(object, value)
    }

    fn require(&self, property: &str) -> Result<&BoundProperty, BindError> {
        self.property(property)
            .ok_or_else(|| BindError::UnknownProperty {
                class: self.name().to_string(),
                property: property.to_string(),
            })
    }

    /// The text of a flag holding a single scalar.
    pub(crate) fn flag_text(
        &self,
        index: usize,
        object: &BoundObject,
        ctx: &BindingContext,
    ) -> Result<Option<String>, CodecError> {
        let Some(flag) = self.flags.get(index) else {
            return Ok(None);
        };
        let Some(MemberValue::Single(item)) = flag.get(object) else {
            return Ok(None);
        };
        let handler = flag.handler(ctx)?;
        let value = handler.expect_scalar(flag.name(), item)?;
        let adapter = scalar_adapter(flag, handler)?;
        adapter
            .to_text(value)
            .map(Some)
            .map_err(|e| CodecError::serialize(e, flag.name()))
    }

    /// Parse `text` with a flag's adapter and store it.
    pub(crate) fn set_flag_text(
        &self,
        index: usize,
        text: &str,
        object: &mut BoundObject,
        ctx: &BindingContext,
        position: usize,
    ) -> Result<(), CodecError> {
        let Some(flag) = self.flags.get(index) else {
            return Ok(());
        };
        let adapter = scalar_adapter(flag, flag.handler(ctx)?)?;
        let value = adapter
            .parse(text)
            .map_err(|e| CodecError::value(e, flag.name(), position))?;
        object.set_slot(flag.slot(), single_scalar(value));
        Ok(())
    }

    /// Copy `object`, rebuilding each member through a fresh collector.
    pub fn deep_copy(
        &self,
        object: &BoundObject,
        ctx: &BindingContext,
    ) -> Result<BoundObject, CodecError> {
        self.check_instance(object)?;
        let mut copy = self.new_instance();
        for property in self.properties() {
            property.copy_into(object, &mut copy, ctx)?;
        }
        if let (Some(field), Some(value)) = (&self.field_value, object.value()) {
            copy.set_value(Some(field.adapter.copy(value)));
        }
        Ok(copy)
    }
}

pub(crate) fn scalar_adapter<'h>(
    property: &BoundProperty,
    handler: &'h DataTypeHandler,
) -> Result<&'h Arc<dyn ScalarAdapter>, CodecError> {
    handler.adapter().ok_or_else(|| CodecError::ItemMismatch {
        property: property.name().to_string(),
        expected: "an object",
        found: "a scalar",
    })
}

/// A single scalar, as stored in a flag slot.
fn single_scalar(value: ScalarValue) -> Option<MemberValue> {
    Some(MemberValue::Single(BoundItem::Scalar(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{MaxOccurs, PropertyDefinition};

    fn registry() -> AdapterRegistry {
        AdapterRegistry::default()
    }

    #[test]
    fn flags_come_first_in_slot_order() {
        let def = ClassDefinition::assembly("item")
            .with_property(PropertyDefinition::field("title", "string"))
            .with_flag(PropertyDefinition::flag("id"));
        let binding = ClassBinding::new(Arc::new(def), &registry()).unwrap();
        assert_eq!(binding.property("id").map(BoundProperty::slot), Some(0));
        assert_eq!(binding.property("title").map(BoundProperty::slot), Some(1));
        assert_eq!(binding.new_instance().class_name(), "item");
    }

    #[test]
    fn json_names_follow_group_names() {
        let def = ClassDefinition::assembly("doc").with_property(
            PropertyDefinition::field("tag", "string")
                .occurs(0, MaxOccurs::Unbounded)
                .group_as(crate::definition::GroupAs::new("tags")),
        );
        let binding = ClassBinding::new(Arc::new(def), &registry()).unwrap();
        assert_eq!(binding.json_property("tags").map(BoundProperty::name), Some("tag"));
        assert!(binding.json_property("tag").is_none());
    }

    #[test]
    fn json_key_must_name_a_flag() {
        let def = ClassDefinition::assembly("entry").json_key("id");
        let err = ClassBinding::new(Arc::new(def), &registry()).unwrap_err();
        assert_eq!(
            err,
            BindError::UnknownFlag {
                class: "entry".into(),
                flag: "id".into(),
                role: "json key",
            }
        );
    }

    #[test]
    fn field_class_needs_a_known_adapter() {
        let def = ClassDefinition::field("when", "date-time");
        assert!(matches!(
            ClassBinding::new(Arc::new(def), &registry()),
            Err(BindError::UnresolvedValueType { .. })
        ));
    }

    #[test]
    fn field_class_value_key_defaults_to_adapter_key() {
        let def = ClassDefinition::field("count", "integer");
        let binding = ClassBinding::new(Arc::new(def), &registry()).unwrap();
        assert_eq!(
            binding.field_value().map(|f| f.key.clone()),
            Some(ValueKey::Fixed("NUMVALUE".into()))
        );
    }

    #[test]
    fn set_checks_shape() {
        let def = ClassDefinition::assembly("doc")
            .with_property(PropertyDefinition::field("title", "string"));
        let binding = ClassBinding::new(Arc::new(def), &registry()).unwrap();
        let mut obj = binding.new_instance();
        assert!(binding
            .set(&mut obj, "title", Some(MemberValue::List(vec![])))
            .is_err());
        binding
            .set(&mut obj, "title", Some(MemberValue::Single(BoundItem::string("t"))))
            .unwrap();
        assert_eq!(
            binding.get(&obj, "title").unwrap(),
            Some(&MemberValue::Single(BoundItem::string("t")))
        );
        assert!(matches!(
            binding.get(&obj, "missing"),
            Err(BindError::UnknownProperty { .. })
        ));
    }
}
