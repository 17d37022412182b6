use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::MarkupError;
use crate::QName;

/// Markup writer that keeps start/end tags balanced.
///
/// The default namespace of each open element is tracked so that an `xmlns`
/// declaration is emitted only when a child leaves its parent's namespace.
/// Namespaced attributes get a prefix declared on the element that uses it.
pub struct MarkupWriter {
    writer: Writer<Vec<u8>>,
    open: Vec<QName>,
}

impl Default for MarkupWriter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MarkupWriter {
    /// `indent` is the number of spaces per nesting level; `None` is compact.
    pub fn new(indent: Option<usize>) -> Self {
        let writer = match indent {
            Some(size) => Writer::new_with_indent(Vec::new(), b' ', size),
            None => Writer::new(Vec::new()),
        };
        Self {
            writer,
            open: Vec::new(),
        }
    }

    pub fn declaration(&mut self) -> Result<(), MarkupError> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    pub fn start_element(
        &mut self,
        name: &QName,
        attributes: &[(QName, String)],
    ) -> Result<(), MarkupError> {
        let mut start = BytesStart::new(name.local_name.as_str());
        let inherited = self.open.last().and_then(|parent| parent.namespace.as_deref());
        if inherited != name.namespace.as_deref() {
            start.push_attribute(("xmlns", name.namespace.as_deref().unwrap_or("")));
        }
        let mut prefixes: Vec<&str> = Vec::new();
        for (key, value) in attributes {
            let Some(ns) = key.namespace.as_deref() else {
                start.push_attribute((key.local_name.as_str(), value.as_str()));
                continue;
            };
            let index = match prefixes.iter().position(|p| *p == ns) {
                Some(index) => index,
                None => {
                    prefixes.push(ns);
                    start.push_attribute((format!("xmlns:ns{}", prefixes.len()).as_str(), ns));
                    prefixes.len() - 1
                }
            };
            let qualified = format!("ns{}:{}", index + 1, key.local_name);
            start.push_attribute((qualified.as_str(), value.as_str()));
        }
        self.write(Event::Start(start))?;
        self.open.push(name.clone());
        Ok(())
    }

    /// Close the innermost open element.
    pub fn end_element(&mut self) -> Result<(), MarkupError> {
        let name = self
            .open
            .pop()
            .ok_or_else(|| MarkupError::Write("no open element to close".to_string()))?;
        self.write(Event::End(BytesEnd::new(name.local_name.as_str())))
    }

    /// Write character data, escaping it.
    pub fn text(&mut self, text: &str) -> Result<(), MarkupError> {
        if text.is_empty() {
            return Ok(());
        }
        self.write(Event::Text(BytesText::new(text)))
    }

    /// Write already-serialized markup verbatim.
    pub fn raw(&mut self, markup: &str) -> Result<(), MarkupError> {
        if markup.is_empty() {
            return Ok(());
        }
        self.write(Event::Text(BytesText::from_escaped(markup)))
    }

    pub fn finish(self) -> Result<String, MarkupError> {
        if let Some(name) = self.open.last() {
            return Err(MarkupError::Write(format!("element <{name}> left open")));
        }
        String::from_utf8(self.writer.into_inner()).map_err(|e| MarkupError::Write(e.to_string()))
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), MarkupError> {
        self.writer
            .write_event(event)
            .map_err(|e| MarkupError::Write(e.to_string()))
    }
}
