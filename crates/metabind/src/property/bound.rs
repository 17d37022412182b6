use std::sync::OnceLock;

use metabind_io::QName;

use super::PropertyInfo;
use crate::codec::json::{JsonReadContext, JsonWriteContext};
use crate::codec::markup::{MarkupReadContext, MarkupWriteContext};
use crate::context::BindingContext;
use crate::definition::PropertyDefinition;
use crate::error::{BindError, CodecError};
use crate::handler::DataTypeHandler;
use crate::value::{BoundObject, MemberValue};

/// A property definition bound to a member slot of its owning class.
///
/// Shape and value codec are derived on first use and then shared by every
/// instance of the class.
#[derive(Debug)]
pub struct BoundProperty {
    definition: PropertyDefinition,
    slot: usize,
    xml_name: QName,
    xml_group_name: Option<QName>,
    info: OnceLock<Result<PropertyInfo, BindError>>,
    handler: OnceLock<Result<DataTypeHandler, BindError>>,
}

impl BoundProperty {
    pub(crate) fn new(definition: PropertyDefinition, slot: usize, default_ns: Option<&str>) -> Self {
        Self {
            xml_name: definition.xml_name(default_ns),
            xml_group_name: definition.xml_group_name(default_ns),
            definition,
            slot,
            info: OnceLock::new(),
            handler: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &PropertyDefinition {
        &self.definition
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn xml_name(&self) -> &QName {
        &self.xml_name
    }

    pub fn xml_group_name(&self) -> Option<&QName> {
        self.xml_group_name.as_ref()
    }

    pub fn json_name(&self) -> &str {
        self.definition.json_name()
    }

    pub fn info(&self) -> Result<PropertyInfo, BindError> {
        self.info
            .get_or_init(|| {
                let info = PropertyInfo::for_definition(&self.definition);
                if let Ok(info) = &info {
                    tracing::debug!(property = %self.definition.name, shape = %info.shape(), "classified property");
                }
                info
            })
            .clone()
    }

    pub fn handler(&self, ctx: &BindingContext) -> Result<&DataTypeHandler, BindError> {
        self.handler
            .get_or_init(|| {
                let handler = DataTypeHandler::resolve(&self.definition, self.info()?, ctx);
                if let Ok(handler) = &handler {
                    tracing::debug!(property = %self.definition.name, ?handler, "resolved value handler");
                }
                handler
            })
            .as_ref()
            .map_err(BindError::clone)
    }

    /// Whether the value is written straight under the parent element.
    pub fn is_unwrapped(&self, handler: &DataTypeHandler) -> bool {
        !self.definition.in_xml_wrapped && handler.is_unwrapped_allowed()
    }

    pub fn get<'o>(&self, object: &'o BoundObject) -> Option<&'o MemberValue> {
        object.slot(self.slot)
    }

    /// Replace the member value, checking it has this property's shape.
    pub fn set(&self, object: &mut BoundObject, value: Option<MemberValue>) -> Result<(), BindError> {
        let info = self.info()?;
        if let Some(value) = &value {
            if !info.accepts(value) {
                let shape = info.shape();
                return Err(BindError::IncompatibleCardinality {
                    property: self.definition.name.clone(),
                    shape,
                    expected: shape.member_kind(),
                    found: value.member_kind(),
                });
            }
        }
        object.set_slot(self.slot, value);
        Ok(())
    }

    pub fn is_value_set(&self, object: &BoundObject) -> Result<bool, BindError> {
        Ok(self.info()?.is_value_set(self.get(object)))
    }

    /// Read this property from the markup stream into `object`.
    ///
    /// Returns `false`, leaving `object` untouched, when the document holds
    /// no occurrence of the property at the cursor.
    pub fn read_markup(
        &self,
        object: &mut BoundObject,
        ctx: &mut MarkupReadContext<'_, '_>,
    ) -> Result<bool, CodecError> {
        let info = self.info()?;
        let handler = self.handler(ctx.bindings())?;
        let mut collector = info.new_collector();
        if !info.read_markup(self, handler, &mut collector, ctx)? {
            return Ok(false);
        }
        object.set_slot(self.slot, collector.into_value());
        Ok(true)
    }

    pub fn write_markup(
        &self,
        object: &BoundObject,
        ctx: &mut MarkupWriteContext<'_>,
    ) -> Result<bool, CodecError> {
        let info = self.info()?;
        let Some(value) = self.get(object).filter(|v| info.is_value_set(Some(v))) else {
            return Ok(false);
        };
        let handler = self.handler(ctx.bindings())?;
        info.write_markup(self, handler, value, ctx)?;
        Ok(true)
    }

    /// Read the value of this property's field; the reader is positioned
    /// just after the field name.
    pub fn read_json(
        &self,
        object: &mut BoundObject,
        ctx: &mut JsonReadContext<'_, '_>,
    ) -> Result<bool, CodecError> {
        let info = self.info()?;
        let handler = self.handler(ctx.bindings())?;
        let mut collector = info.new_collector();
        if !info.read_json(self, handler, &mut collector, ctx)? {
            return Ok(false);
        }
        object.set_slot(self.slot, collector.into_value());
        Ok(true)
    }

    pub fn write_json(
        &self,
        object: &BoundObject,
        ctx: &mut JsonWriteContext<'_>,
    ) -> Result<bool, CodecError> {
        let info = self.info()?;
        let Some(value) = self.get(object).filter(|v| info.is_value_set(Some(v))) else {
            return Ok(false);
        };
        let handler = self.handler(ctx.bindings())?;
        info.write_json(self, handler, value, ctx)?;
        Ok(true)
    }

    /// Rebuild this property's member of `source` into `target`.
    pub(crate) fn copy_into(
        &self,
        source: &BoundObject,
        target: &mut BoundObject,
        ctx: &BindingContext,
    ) -> Result<(), CodecError> {
        let Some(value) = self.get(source) else {
            return Ok(());
        };
        let info = self.info()?;
        let handler = self.handler(ctx)?;
        let name = self.name();
        let mut collector = info.new_collector();
        match value {
            MemberValue::Single(item) => collector.add(handler.copy_item(name, item, ctx)?),
            MemberValue::List(items) => {
                for item in items {
                    collector.add(handler.copy_item(name, item, ctx)?);
                }
            }
            MemberValue::Map(entries) => {
                for (key, item) in entries {
                    collector.add_keyed(key.clone(), handler.copy_item(name, item, ctx)?);
                }
            }
        }
        target.set_slot(self.slot, collector.into_value());
        Ok(())
    }
}
