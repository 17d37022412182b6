//! Value codec selection for a property: scalar adapter or nested class.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::adapter::ScalarAdapter;
use crate::binding::{scalar_adapter, ClassBinding};
use crate::context::BindingContext;
use crate::definition::{PropertyDefinition, ValueType};
use crate::error::{BindError, CodecError};
use crate::property::PropertyInfo;
use crate::value::{BoundItem, BoundObject, MemberValue, ScalarValue};

pub enum DataTypeHandler {
    Scalar(Arc<dyn ScalarAdapter>),
    /// The binding is owned by the [`BindingContext`] cache; holding it weakly
    /// lets self-referential classes point back at themselves.
    Nested {
        class: String,
        binding: Weak<ClassBinding>,
    },
}

impl fmt::Debug for DataTypeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataTypeHandler::Scalar(adapter) => f.debug_tuple("Scalar").field(&adapter.id()).finish(),
            DataTypeHandler::Nested { class, .. } => f.debug_tuple("Nested").field(class).finish(),
        }
    }
}

impl DataTypeHandler {
    /// Resolve the handler for a property. An explicit adapter wins;
    /// otherwise the value type must name a registered class.
    pub(crate) fn resolve(
        definition: &PropertyDefinition,
        info: PropertyInfo,
        ctx: &BindingContext,
    ) -> Result<Self, BindError> {
        let unresolved = || BindError::UnresolvedValueType {
            property: definition.name.clone(),
            type_name: definition.value_type.name().to_string(),
        };
        let handler = match &definition.value_type {
            ValueType::Adapter(id) => {
                DataTypeHandler::Scalar(ctx.adapters().get(id).cloned().ok_or_else(unresolved)?)
            }
            ValueType::Class(name) => {
                let binding = ctx.class_binding(name).map_err(|err| match err {
                    BindError::UnknownClass(_) => unresolved(),
                    other => other,
                })?;
                if info == PropertyInfo::Map && binding.json_key_flag().is_none() {
                    return Err(BindError::MissingJsonKey {
                        property: definition.name.clone(),
                        class: name.clone(),
                    });
                }
                DataTypeHandler::Nested {
                    class: name.clone(),
                    binding: Arc::downgrade(&binding),
                }
            }
        };
        if info == PropertyInfo::Map && matches!(handler, DataTypeHandler::Scalar(_)) {
            return Err(BindError::MissingJsonKey {
                property: definition.name.clone(),
                class: definition.value_type.name().to_string(),
            });
        }
        Ok(handler)
    }

    pub fn adapter(&self) -> Option<&Arc<dyn ScalarAdapter>> {
        match self {
            DataTypeHandler::Scalar(adapter) => Some(adapter),
            DataTypeHandler::Nested { .. } => None,
        }
    }

    pub fn class_binding(&self) -> Result<Option<Arc<ClassBinding>>, BindError> {
        match self {
            DataTypeHandler::Scalar(_) => Ok(None),
            DataTypeHandler::Nested { class, binding } => upgrade(class, binding).map(Some),
        }
    }

    pub fn is_unwrapped_allowed(&self) -> bool {
        self.adapter()
            .is_some_and(|adapter| adapter.is_unwrapped_value_allowed_in_xml())
    }

    pub(crate) fn expect_scalar<'v>(
        &self,
        property: &str,
        item: &'v BoundItem,
    ) -> Result<&'v ScalarValue, CodecError> {
        item.as_scalar().ok_or_else(|| CodecError::ItemMismatch {
            property: property.to_string(),
            expected: "a scalar",
            found: item.kind_name(),
        })
    }

    pub(crate) fn expect_object<'v>(
        &self,
        property: &str,
        item: &'v BoundItem,
    ) -> Result<&'v BoundObject, CodecError> {
        item.as_object().ok_or_else(|| CodecError::ItemMismatch {
            property: property.to_string(),
            expected: "an object",
            found: item.kind_name(),
        })
    }

    /// Copy one item: adapter copy for scalars, recursive copy for objects.
    pub fn copy_item(
        &self,
        property: &str,
        item: &BoundItem,
        ctx: &BindingContext,
    ) -> Result<BoundItem, CodecError> {
        match self {
            DataTypeHandler::Scalar(adapter) => {
                let value = self.expect_scalar(property, item)?;
                Ok(BoundItem::Scalar(adapter.copy(value)))
            }
            DataTypeHandler::Nested { class, binding } => {
                let object = self.expect_object(property, item)?;
                Ok(BoundItem::Object(upgrade(class, binding)?.deep_copy(object, ctx)?))
            }
        }
    }

    /// The key of an item inside a keyed collection: the text of its class's
    /// json key flag.
    pub(crate) fn item_key(
        &self,
        item: &BoundItem,
        ctx: &BindingContext,
    ) -> Result<Option<String>, CodecError> {
        let DataTypeHandler::Nested { class, binding } = self else {
            return Ok(None);
        };
        let Some(object) = item.as_object() else {
            return Ok(None);
        };
        let binding = upgrade(class, binding)?;
        match binding.json_key_index() {
            Some(index) => binding.flag_text(index, object, ctx),
            None => Ok(None),
        }
    }

    /// A copy of a keyed-collection item whose json key flag is unset, with
    /// the flag filled in from the collection key. `None` when the item
    /// already carries its key.
    pub(crate) fn keyed_item(
        &self,
        key: &str,
        item: &BoundItem,
        ctx: &BindingContext,
    ) -> Result<Option<BoundItem>, CodecError> {
        let DataTypeHandler::Nested { class, binding } = self else {
            return Ok(None);
        };
        let Some(object) = item.as_object() else {
            return Ok(None);
        };
        let binding = upgrade(class, binding)?;
        let Some(flag) = binding.json_key_flag() else {
            return Ok(None);
        };
        if flag.get(object).is_some() {
            return Ok(None);
        }
        let adapter = scalar_adapter(flag, flag.handler(ctx)?)?;
        let value = adapter
            .parse(key)
            .map_err(|e| CodecError::serialize(e, flag.name()))?;
        let mut keyed = object.clone();
        keyed.set_slot(
            flag.slot(),
            Some(MemberValue::Single(BoundItem::Scalar(value))),
        );
        Ok(Some(BoundItem::Object(keyed)))
    }
}

pub(crate) fn upgrade(class: &str, binding: &Weak<ClassBinding>) -> Result<Arc<ClassBinding>, BindError> {
    binding
        .upgrade()
        .ok_or_else(|| BindError::UnknownClass(class.to_string()))
}
