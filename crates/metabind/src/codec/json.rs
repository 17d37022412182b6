//! Key/value codec: named fields, arrays, keyed objects and value keys.

use metabind_io::json::describe;
use metabind_io::{JsonReader, JsonToken, JsonWriter};
use serde_json::Value;

use crate::binding::{ClassBinding, FieldValue, ValueKey};
use crate::collector::PropertyCollector;
use crate::context::BindingContext;
use crate::definition::JsonGroupAs;
use crate::error::{CodecError, DocumentError};
use crate::handler::{upgrade, DataTypeHandler};
use crate::options::UnknownFields;
use crate::property::{BoundProperty, PropertyInfo};
use crate::value::{BoundItem, BoundObject, MemberValue, ScalarValue};

pub struct JsonReadContext<'b, 'i> {
    bindings: &'b BindingContext,
    reader: JsonReader<'i>,
}

impl<'b, 'i> JsonReadContext<'b, 'i> {
    pub fn new(bindings: &'b BindingContext, input: &'i str) -> Self {
        Self {
            bindings,
            reader: JsonReader::new(input),
        }
    }

    pub fn bindings(&self) -> &'b BindingContext {
        self.bindings
    }

    pub fn reader(&mut self) -> &mut JsonReader<'i> {
        &mut self.reader
    }

    fn unexpected(&mut self, name: &str, expected: &'static str) -> CodecError {
        let position = self.reader.position();
        let found = match self.reader.peek() {
            Ok(token) => describe(token),
            Err(err) => return err.into(),
        };
        DocumentError::UnexpectedToken {
            name: name.to_string(),
            expected,
            found,
            position,
        }
        .into()
    }
}

pub struct JsonWriteContext<'b> {
    bindings: &'b BindingContext,
    writer: JsonWriter,
}

impl<'b> JsonWriteContext<'b> {
    pub fn new(bindings: &'b BindingContext) -> Self {
        Self {
            bindings,
            writer: JsonWriter::new(bindings.options().write.indent),
        }
    }

    pub fn bindings(&self) -> &'b BindingContext {
        self.bindings
    }

    pub fn writer(&mut self) -> &mut JsonWriter {
        &mut self.writer
    }

    pub fn finish(self) -> Result<String, CodecError> {
        Ok(self.writer.finish()?)
    }
}

impl PropertyInfo {
    /// Read the value of a matched field into `collector`. A `null` value
    /// counts as absent.
    pub(crate) fn read_json(
        &self,
        property: &BoundProperty,
        handler: &DataTypeHandler,
        collector: &mut PropertyCollector,
        ctx: &mut JsonReadContext<'_, '_>,
    ) -> Result<bool, CodecError> {
        if matches!(ctx.reader.peek()?, Some(JsonToken::Scalar(Value::Null))) {
            ctx.reader.next_token()?;
            return Ok(false);
        }
        match self {
            PropertyInfo::Singleton => collector.add(handler.read_json_item(property, None, ctx)?),
            PropertyInfo::List { .. } => {
                if !ctx.reader.is_start_array()? {
                    collector.add(handler.read_json_item(property, None, ctx)?);
                    return Ok(true);
                }
                ctx.reader.expect_start_array()?;
                while !ctx.reader.is_end_array()? {
                    collector.add(handler.read_json_item(property, None, ctx)?);
                }
                ctx.reader.expect_end_array()?;
            }
            PropertyInfo::Map => {
                if !ctx.reader.is_start_object()? {
                    return Err(ctx.unexpected(property.json_name(), "an object"));
                }
                ctx.reader.expect_start_object()?;
                while !ctx.reader.is_end_object()? {
                    let key = ctx.reader.expect_field_name()?;
                    let item = handler.read_json_item(property, Some(&key), ctx)?;
                    collector.add_keyed(key, item);
                }
                ctx.reader.expect_end_object()?;
            }
        }
        Ok(true)
    }

    /// Write the field of a non-empty member value.
    pub(crate) fn write_json(
        &self,
        property: &BoundProperty,
        handler: &DataTypeHandler,
        value: &MemberValue,
        ctx: &mut JsonWriteContext<'_>,
    ) -> Result<(), CodecError> {
        ctx.writer.field_name(property.json_name())?;
        match value {
            MemberValue::Single(item) => handler.write_json_item(property, item, false, ctx)?,
            MemberValue::List(items) => {
                let bare = matches!(
                    self,
                    PropertyInfo::List {
                        json: JsonGroupAs::SingletonOrList
                    }
                ) && items.len() == 1;
                if bare {
                    handler.write_json_item(property, &items[0], false, ctx)?;
                } else {
                    ctx.writer.start_array()?;
                    for item in items {
                        handler.write_json_item(property, item, false, ctx)?;
                    }
                    ctx.writer.end_array()?;
                }
            }
            MemberValue::Map(entries) => {
                ctx.writer.start_object()?;
                for (key, item) in entries {
                    let key = match handler.item_key(item, ctx.bindings)? {
                        Some(flag) => flag,
                        None => key.clone(),
                    };
                    ctx.writer.field_name(&key)?;
                    handler.write_json_item(property, item, true, ctx)?;
                }
                ctx.writer.end_object()?;
            }
        }
        Ok(())
    }
}

impl DataTypeHandler {
    /// Read one item value. `key` is the field name of a keyed entry.
    pub(crate) fn read_json_item(
        &self,
        property: &BoundProperty,
        key: Option<&str>,
        ctx: &mut JsonReadContext<'_, '_>,
    ) -> Result<BoundItem, CodecError> {
        let item = match self {
            DataTypeHandler::Scalar(adapter) => {
                if !ctx.reader.is_scalar()? {
                    return Err(ctx.unexpected(property.json_name(), "a scalar"));
                }
                let position = ctx.reader.position();
                let value = ctx.reader.expect_scalar()?;
                let value = adapter
                    .parse_json(&value)
                    .map_err(|e| CodecError::value(e, property.name(), position))?;
                BoundItem::Scalar(value)
            }
            DataTypeHandler::Nested { class, binding } => {
                let binding = upgrade(class, binding)?;
                BoundItem::Object(binding.read_json_object(key, ctx)?)
            }
        };
        tracing::trace!(property = property.name(), key, "read json item");
        Ok(item)
    }

    pub(crate) fn write_json_item(
        &self,
        property: &BoundProperty,
        item: &BoundItem,
        omit_key: bool,
        ctx: &mut JsonWriteContext<'_>,
    ) -> Result<(), CodecError> {
        match self {
            DataTypeHandler::Scalar(adapter) => {
                let value = self.expect_scalar(property.name(), item)?;
                let json = adapter
                    .to_json(value)
                    .map_err(|e| CodecError::serialize(e, property.name()))?;
                ctx.writer.scalar(&json)?;
                Ok(())
            }
            DataTypeHandler::Nested { class, binding } => {
                let object = self.expect_object(property.name(), item)?;
                upgrade(class, binding)?.write_json_object(object, omit_key, ctx)
            }
        }
    }
}

impl ClassBinding {
    /// Read an instance from the value at the cursor. `key`, when given,
    /// sets the json key flag.
    pub fn read_json_object(
        &self,
        key: Option<&str>,
        ctx: &mut JsonReadContext<'_, '_>,
    ) -> Result<BoundObject, CodecError> {
        let mut object = self.new_instance();
        let position = ctx.reader.position();
        match self.field_value() {
            Some(field) if ctx.reader.is_scalar()? => {
                let value = ctx.reader.expect_scalar()?;
                let value = field
                    .adapter
                    .parse_json(&value)
                    .map_err(|e| CodecError::value(e, self.name(), position))?;
                object.set_value(Some(value));
            }
            _ => self.read_json_fields(&mut object, ctx)?,
        }
        if let (Some(key), Some(index)) = (key, self.json_key_index()) {
            self.set_flag_text(index, key, &mut object, ctx.bindings, position)?;
        }
        Ok(object)
    }

    fn read_json_fields(
        &self,
        object: &mut BoundObject,
        ctx: &mut JsonReadContext<'_, '_>,
    ) -> Result<(), CodecError> {
        if !ctx.reader.is_start_object()? {
            return Err(ctx.unexpected(self.name(), "an object"));
        }
        ctx.reader.expect_start_object()?;
        while !ctx.reader.is_end_object()? {
            let position = ctx.reader.position();
            let name = ctx.reader.expect_field_name()?;
            if let Some(property) = self.json_property(&name) {
                property.read_json(object, ctx)?;
                continue;
            }
            let Some(field) = self.field_value() else {
                skip_unknown(&name, position, ctx)?;
                continue;
            };
            match &field.key {
                ValueKey::Fixed(key) if *key != name => skip_unknown(&name, position, ctx)?,
                ValueKey::Fixed(_) => {
                    let value = self.read_json_value(field, ctx)?;
                    object.set_value(Some(value));
                }
                ValueKey::Flag(index) => {
                    self.set_flag_text(*index, &name, object, ctx.bindings, position)?;
                    let value = self.read_json_value(field, ctx)?;
                    object.set_value(Some(value));
                }
            }
        }
        ctx.reader.expect_end_object()?;
        Ok(())
    }

    fn read_json_value(
        &self,
        field: &FieldValue,
        ctx: &mut JsonReadContext<'_, '_>,
    ) -> Result<ScalarValue, CodecError> {
        if !ctx.reader.is_scalar()? {
            return Err(ctx.unexpected(self.name(), "a scalar"));
        }
        let position = ctx.reader.position();
        let value = ctx.reader.expect_scalar()?;
        field
            .adapter
            .parse_json(&value)
            .map_err(|e| CodecError::value(e, self.name(), position))
    }

    /// Write `object` as a key/value object. With `omit_key` the json key
    /// flag is left out; the enclosing keyed collection carries it.
    pub fn write_json_object(
        &self,
        object: &BoundObject,
        omit_key: bool,
        ctx: &mut JsonWriteContext<'_>,
    ) -> Result<(), CodecError> {
        self.check_instance(object)?;
        let value_key_flag = match self.field_value().map(|f| &f.key) {
            Some(ValueKey::Flag(index)) if object.value().is_some() => Some(*index),
            _ => None,
        };
        ctx.writer.start_object()?;
        for (index, flag) in self.flags().iter().enumerate() {
            let omitted = (omit_key && Some(index) == self.json_key_index())
                || Some(index) == value_key_flag;
            if !omitted {
                flag.write_json(object, ctx)?;
            }
        }
        match self.field_value() {
            Some(field) => {
                if let Some(value) = object.value() {
                    let name = match &field.key {
                        ValueKey::Fixed(key) => key.clone(),
                        ValueKey::Flag(index) => self
                            .flag_text(*index, object, ctx.bindings)?
                            .ok_or_else(|| CodecError::MissingValueKey {
                                class: self.name().to_string(),
                                flag: self
                                    .flags()
                                    .get(*index)
                                    .map(|f| f.name().to_string())
                                    .unwrap_or_default(),
                            })?,
                    };
                    let json = field
                        .adapter
                        .to_json(value)
                        .map_err(|e| CodecError::serialize(e, self.name()))?;
                    ctx.writer.field_name(&name)?;
                    ctx.writer.scalar(&json)?;
                }
            }
            None => {
                for property in self.model() {
                    property.write_json(object, ctx)?;
                }
            }
        }
        ctx.writer.end_object()?;
        Ok(())
    }
}

fn skip_unknown(
    name: &str,
    position: usize,
    ctx: &mut JsonReadContext<'_, '_>,
) -> Result<(), CodecError> {
    match ctx.bindings.options().read.unknown_fields {
        UnknownFields::Error => Err(DocumentError::UnknownField {
            name: name.to_string(),
            position,
        }
        .into()),
        UnknownFields::Skip => {
            tracing::warn!(field = name, position, "skipping unknown field");
            ctx.reader.skip_value()?;
            Ok(())
        }
    }
}
