//! Markup codec: wrapper and group elements, attributes for flags,
//! unwrapped scalar content.

use metabind_io::markup::{describe, MarkupReader, MarkupWriter, StartElement};
use metabind_io::{MarkupEvent, QName};

use crate::adapter::MarkupContent;
use crate::binding::{scalar_adapter, ClassBinding};
use crate::collector::PropertyCollector;
use crate::context::BindingContext;
use crate::error::{CodecError, DocumentError};
use crate::handler::{upgrade, DataTypeHandler};
use crate::options::UnknownFields;
use crate::property::{BoundProperty, PropertyInfo};
use crate::value::{BoundItem, BoundObject, MemberValue};

pub struct MarkupReadContext<'b, 'i> {
    bindings: &'b BindingContext,
    reader: MarkupReader<'i>,
}

impl<'b, 'i> MarkupReadContext<'b, 'i> {
    pub fn new(bindings: &'b BindingContext, input: &'i str) -> Self {
        Self {
            bindings,
            reader: MarkupReader::new(input),
        }
    }

    pub fn bindings(&self) -> &'b BindingContext {
        self.bindings
    }

    pub fn reader(&mut self) -> &mut MarkupReader<'i> {
        &mut self.reader
    }
}

pub struct MarkupWriteContext<'b> {
    bindings: &'b BindingContext,
    writer: MarkupWriter,
}

impl<'b> MarkupWriteContext<'b> {
    pub fn new(bindings: &'b BindingContext) -> Self {
        Self {
            bindings,
            writer: MarkupWriter::new(bindings.options().write.indent),
        }
    }

    pub fn bindings(&self) -> &'b BindingContext {
        self.bindings
    }

    pub fn writer(&mut self) -> &mut MarkupWriter {
        &mut self.writer
    }

    pub fn finish(self) -> Result<String, CodecError> {
        Ok(self.writer.finish()?)
    }
}

fn write_content(
    writer: &mut MarkupWriter,
    content: MarkupContent,
) -> Result<(), CodecError> {
    match content {
        MarkupContent::Text(text) => writer.text(&text)?,
        MarkupContent::Raw(markup) => writer.raw(&markup)?,
    }
    Ok(())
}

impl PropertyInfo {
    /// Read every occurrence at the cursor into `collector`.
    pub(crate) fn read_markup(
        &self,
        property: &BoundProperty,
        handler: &DataTypeHandler,
        collector: &mut PropertyCollector,
        ctx: &mut MarkupReadContext<'_, '_>,
    ) -> Result<bool, CodecError> {
        if let PropertyInfo::Singleton = self {
            return Ok(match handler.read_markup_item(property, ctx)? {
                Some(item) => {
                    collector.add(item);
                    true
                }
                None => false,
            });
        }
        let Some(group) = property.xml_group_name() else {
            return Ok(self.read_markup_items(property, handler, collector, ctx)? > 0);
        };
        if !ctx.reader.is_start_of(group)? {
            return Ok(false);
        }
        ctx.reader.consume_start(group)?;
        self.read_markup_items(property, handler, collector, ctx)?;
        ctx.reader.consume_end(group)?;
        Ok(true)
    }

    fn read_markup_items(
        &self,
        property: &BoundProperty,
        handler: &DataTypeHandler,
        collector: &mut PropertyCollector,
        ctx: &mut MarkupReadContext<'_, '_>,
    ) -> Result<usize, CodecError> {
        let mut count = 0;
        loop {
            let position = ctx.reader.position();
            let Some(item) = handler.read_markup_item(property, ctx)? else {
                return Ok(count);
            };
            count += 1;
            if let PropertyInfo::Map = self {
                let key = handler
                    .item_key(&item, ctx.bindings)?
                    .ok_or_else(|| DocumentError::MissingKey {
                        property: property.name().to_string(),
                        position,
                    })?;
                collector.add_keyed(key, item);
            } else {
                collector.add(item);
            }
        }
    }

    /// Write a non-empty member value, enclosed in its group element if any.
    pub(crate) fn write_markup(
        &self,
        property: &BoundProperty,
        handler: &DataTypeHandler,
        value: &MemberValue,
        ctx: &mut MarkupWriteContext<'_>,
    ) -> Result<(), CodecError> {
        let group = match self {
            PropertyInfo::Singleton => None,
            _ => property.xml_group_name(),
        };
        if let Some(group) = group {
            ctx.writer.start_element(group, &[])?;
        }
        match value {
            MemberValue::Single(item) => handler.write_markup_item(property, item, ctx)?,
            MemberValue::List(items) => {
                for item in items {
                    handler.write_markup_item(property, item, ctx)?;
                }
            }
            MemberValue::Map(entries) => {
                for (key, item) in entries {
                    match handler.keyed_item(key, item, ctx.bindings)? {
                        Some(keyed) => handler.write_markup_item(property, &keyed, ctx)?,
                        None => handler.write_markup_item(property, item, ctx)?,
                    }
                }
            }
        }
        if group.is_some() {
            ctx.writer.end_element()?;
        }
        Ok(())
    }
}

impl DataTypeHandler {
    /// Read one item, or `None` when the cursor holds no occurrence.
    pub(crate) fn read_markup_item(
        &self,
        property: &BoundProperty,
        ctx: &mut MarkupReadContext<'_, '_>,
    ) -> Result<Option<BoundItem>, CodecError> {
        if property.is_unwrapped(self) {
            let adapter = scalar_adapter(property, self)?;
            let position = ctx.reader.position();
            let Some(text) = adapter.read_markup(&mut ctx.reader, true)? else {
                return Ok(None);
            };
            let value = adapter
                .parse(&text)
                .map_err(|e| CodecError::value(e, property.name(), position))?;
            return Ok(Some(BoundItem::Scalar(value)));
        }

        let name = property.xml_name();
        if !ctx.reader.is_start_of(name)? {
            return Ok(None);
        }
        let start = ctx.reader.consume_start(name)?;
        let item = match self {
            DataTypeHandler::Scalar(adapter) => {
                let position = ctx.reader.position();
                let text = adapter.read_markup(&mut ctx.reader, false)?.unwrap_or_default();
                let value = adapter
                    .parse(&text)
                    .map_err(|e| CodecError::value(e, property.name(), position))?;
                BoundItem::Scalar(value)
            }
            DataTypeHandler::Nested { class, binding } => {
                let binding = upgrade(class, binding)?;
                BoundItem::Object(binding.read_markup_body(&start, ctx)?)
            }
        };
        ctx.reader.consume_end(name)?;
        tracing::trace!(property = property.name(), "read markup item");
        Ok(Some(item))
    }

    pub(crate) fn write_markup_item(
        &self,
        property: &BoundProperty,
        item: &BoundItem,
        ctx: &mut MarkupWriteContext<'_>,
    ) -> Result<(), CodecError> {
        match self {
            DataTypeHandler::Scalar(adapter) => {
                let value = self.expect_scalar(property.name(), item)?;
                let content = adapter
                    .markup_content(value)
                    .map_err(|e| CodecError::serialize(e, property.name()))?;
                if property.is_unwrapped(self) {
                    return write_content(&mut ctx.writer, content);
                }
                ctx.writer.start_element(property.xml_name(), &[])?;
                write_content(&mut ctx.writer, content)?;
                ctx.writer.end_element()?;
                Ok(())
            }
            DataTypeHandler::Nested { class, binding } => {
                let object = self.expect_object(property.name(), item)?;
                upgrade(class, binding)?.write_markup_element(object, property.xml_name(), ctx)
            }
        }
    }
}

impl ClassBinding {
    /// Read an instance from the element whose start tag was just consumed.
    /// The end tag is left for the caller.
    pub fn read_markup_body(
        &self,
        start: &StartElement,
        ctx: &mut MarkupReadContext<'_, '_>,
    ) -> Result<BoundObject, CodecError> {
        let mut object = self.new_instance();
        for (index, flag) in self.flags().iter().enumerate() {
            if let Some(text) = start.attribute(flag.xml_name()) {
                let position = ctx.reader.position();
                self.set_flag_text(index, text, &mut object, ctx.bindings, position)?;
            }
        }
        match self.field_value() {
            Some(field) => {
                let position = ctx.reader.position();
                let text = field
                    .adapter
                    .read_markup(&mut ctx.reader, false)?
                    .unwrap_or_default();
                let value = field
                    .adapter
                    .parse(&text)
                    .map_err(|e| CodecError::value(e, self.name(), position))?;
                object.set_value(Some(value));
            }
            None => self.read_markup_model(&mut object, &start.name, ctx)?,
        }
        Ok(object)
    }

    /// Read model properties in declaration order until the parent closes.
    /// Content no remaining property claims is unknown.
    fn read_markup_model(
        &self,
        object: &mut BoundObject,
        parent: &QName,
        ctx: &mut MarkupReadContext<'_, '_>,
    ) -> Result<(), CodecError> {
        let mut next = 0;
        while !ctx.reader.is_end()? && !ctx.reader.is_eof()? {
            let mut handled = false;
            for (index, property) in self.model().iter().enumerate().skip(next) {
                if property.read_markup(object, ctx)? {
                    next = index + 1;
                    handled = true;
                    break;
                }
            }
            if !handled {
                skip_unknown(parent, ctx)?;
            }
        }
        Ok(())
    }

    /// Write `object` as an element named `name`, flags as attributes.
    pub fn write_markup_element(
        &self,
        object: &BoundObject,
        name: &QName,
        ctx: &mut MarkupWriteContext<'_>,
    ) -> Result<(), CodecError> {
        self.check_instance(object)?;
        let mut attributes = Vec::new();
        for (index, flag) in self.flags().iter().enumerate() {
            if let Some(text) = self.flag_text(index, object, ctx.bindings)? {
                attributes.push((flag.xml_name().clone(), text));
            }
        }
        ctx.writer.start_element(name, &attributes)?;
        match self.field_value() {
            Some(field) => {
                if let Some(value) = object.value() {
                    let content = field
                        .adapter
                        .markup_content(value)
                        .map_err(|e| CodecError::serialize(e, self.name()))?;
                    write_content(&mut ctx.writer, content)?;
                }
            }
            None => {
                for property in self.model() {
                    property.write_markup(object, ctx)?;
                }
            }
        }
        ctx.writer.end_element()?;
        Ok(())
    }
}

fn skip_unknown(parent: &QName, ctx: &mut MarkupReadContext<'_, '_>) -> Result<(), CodecError> {
    let position = ctx.reader.position();
    let (found, is_start) = match ctx.reader.peek()? {
        Some(event) => (event.to_string(), matches!(event, MarkupEvent::Start(_))),
        None => (describe(None), false),
    };
    match ctx.bindings.options().read.unknown_fields {
        UnknownFields::Error => Err(DocumentError::UnexpectedContent {
            parent: parent.to_string(),
            found,
            position,
        }
        .into()),
        UnknownFields::Skip => {
            tracing::warn!(parent = %parent, found = %found, position, "skipping unknown markup content");
            if is_start {
                ctx.reader.skip_element()?;
            } else {
                ctx.reader.next_event()?;
            }
            Ok(())
        }
    }
}
