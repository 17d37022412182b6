//! Markup element token stream.
//!
//! [`MarkupReader`] turns a document into [`MarkupEvent`]s with one event of
//! lookahead. Empty elements (`<a/>`) are reported as a start/end pair,
//! comments, processing instructions and declarations are dropped, and CDATA
//! sections are reported as text.
//!
//! [`MarkupWriter`] is the mirror image: it always pairs starts with ends and
//! only declares a default namespace when it differs from the enclosing one.

mod reader;
mod writer;

pub use reader::MarkupReader;
pub use writer::MarkupWriter;

use std::fmt;

use crate::QName;

/// A start tag with its resolved attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct StartElement {
    pub name: QName,
    pub attributes: Vec<Attribute>,
}

impl StartElement {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
        }
    }

    /// Look up an attribute value by qualified name.
    pub fn attribute(&self, name: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| &a.name == name)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupEvent {
    Start(StartElement),
    End(QName),
    Text(String),
}

impl MarkupEvent {
    /// True for text consisting only of XML whitespace.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, MarkupEvent::Text(t) if t.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r')))
    }
}

impl fmt::Display for MarkupEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupEvent::Start(start) => write!(f, "<{}>", start.name),
            MarkupEvent::End(name) => write!(f, "</{name}>"),
            MarkupEvent::Text(text) => write!(f, "text {text:?}"),
        }
    }
}

/// Describe an optional upcoming event for diagnostics.
pub fn describe(event: Option<&MarkupEvent>) -> String {
    match event {
        Some(event) => event.to_string(),
        None => "end of input".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("malformed markup at byte {position}: {message}")]
    Syntax { message: String, position: usize },
    #[error("undeclared namespace prefix `{prefix}` at byte {position}")]
    UnboundPrefix { prefix: String, position: usize },
    #[error("expected start of <{expected}> at byte {position}, found {found}")]
    ExpectedStart {
        expected: QName,
        found: String,
        position: usize,
    },
    #[error("expected end of <{expected}> at byte {position}, found {found}")]
    ExpectedEnd {
        expected: QName,
        found: String,
        position: usize,
    },
    #[error("unexpected end of input at byte {position}")]
    UnexpectedEof { position: usize },
    #[error("markup write failed: {0}")]
    Write(String),
}

/// Escape character data for inclusion in element content.
pub fn escape_text(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

/// Serialize events back to markup text, ignoring namespaces.
///
/// Used by adapters that keep mixed content as a normalized markup string.
pub fn events_to_string(events: &[MarkupEvent]) -> String {
    let mut out = String::new();
    for event in events {
        match event {
            MarkupEvent::Start(start) => {
                out.push('<');
                out.push_str(&start.name.local_name);
                for attr in &start.attributes {
                    out.push(' ');
                    out.push_str(&attr.name.local_name);
                    out.push_str("=\"");
                    out.push_str(&escape_text(&attr.value));
                    out.push('"');
                }
                out.push('>');
            }
            MarkupEvent::End(name) => {
                out.push_str("</");
                out.push_str(&name.local_name);
                out.push('>');
            }
            MarkupEvent::Text(text) => out.push_str(&escape_text(text)),
        }
    }
    out
}
