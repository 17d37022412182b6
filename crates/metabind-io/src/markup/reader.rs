use std::collections::VecDeque;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use super::{describe, Attribute, MarkupError, MarkupEvent, StartElement};
use crate::QName;

/// Pull-based markup reader with namespace resolution and lookahead.
///
/// Every `peek*`/`is_*` query that concerns elements skips whitespace-only
/// text first; [`MarkupReader::peek`] and [`MarkupReader::read_text`] do not.
pub struct MarkupReader<'i> {
    reader: NsReader<&'i [u8]>,
    pending: VecDeque<(MarkupEvent, usize)>,
    eof: bool,
    open: Vec<QName>,
}

impl<'i> MarkupReader<'i> {
    pub fn new(input: &'i str) -> Self {
        Self {
            reader: NsReader::from_str(input),
            pending: VecDeque::new(),
            eof: false,
            open: Vec::new(),
        }
    }

    /// Byte offset of the upcoming event, or of the end of input.
    pub fn position(&self) -> usize {
        match self.pending.front() {
            Some((_, position)) => *position,
            None => self.reader.buffer_position() as usize,
        }
    }

    /// The innermost element whose start has been consumed and whose end has not.
    pub fn parent(&self) -> Option<&QName> {
        self.open.last()
    }

    pub fn peek(&mut self) -> Result<Option<&MarkupEvent>, MarkupError> {
        self.fill()?;
        Ok(self.pending.front().map(|(event, _)| event))
    }

    pub fn next_event(&mut self) -> Result<Option<MarkupEvent>, MarkupError> {
        self.fill()?;
        let event = self.pending.pop_front().map(|(event, _)| event);
        match &event {
            Some(MarkupEvent::Start(start)) => self.open.push(start.name.clone()),
            Some(MarkupEvent::End(_)) => {
                self.open.pop();
            }
            _ => {}
        }
        Ok(event)
    }

    /// Drop whitespace-only text events in front of the cursor.
    pub fn skip_whitespace(&mut self) -> Result<(), MarkupError> {
        loop {
            self.fill()?;
            match self.pending.front() {
                Some((event, _)) if event.is_whitespace() => {
                    self.pending.pop_front();
                }
                _ => return Ok(()),
            }
        }
    }

    /// The upcoming start element, if the next significant event is one.
    pub fn peek_start(&mut self) -> Result<Option<&StartElement>, MarkupError> {
        self.skip_whitespace()?;
        Ok(match self.pending.front() {
            Some((MarkupEvent::Start(start), _)) => Some(start),
            _ => None,
        })
    }

    pub fn is_start_of(&mut self, name: &QName) -> Result<bool, MarkupError> {
        Ok(self.peek_start()?.is_some_and(|start| &start.name == name))
    }

    /// True when the next significant event closes the current element.
    pub fn is_end(&mut self) -> Result<bool, MarkupError> {
        self.skip_whitespace()?;
        Ok(matches!(self.pending.front(), Some((MarkupEvent::End(_), _))))
    }

    /// True when nothing but whitespace remains.
    pub fn is_eof(&mut self) -> Result<bool, MarkupError> {
        self.skip_whitespace()?;
        Ok(self.pending.is_empty())
    }

    pub fn consume_start(&mut self, name: &QName) -> Result<StartElement, MarkupError> {
        self.skip_whitespace()?;
        let position = self.position();
        match self.next_event()? {
            Some(MarkupEvent::Start(start)) if &start.name == name => Ok(start),
            other => Err(MarkupError::ExpectedStart {
                expected: name.clone(),
                found: describe(other.as_ref()),
                position,
            }),
        }
    }

    pub fn consume_end(&mut self, name: &QName) -> Result<(), MarkupError> {
        self.skip_whitespace()?;
        let position = self.position();
        match self.next_event()? {
            Some(MarkupEvent::End(end)) if &end == name => Ok(()),
            other => Err(MarkupError::ExpectedEnd {
                expected: name.clone(),
                found: describe(other.as_ref()),
                position,
            }),
        }
    }

    /// Concatenate the text events at the cursor. Whitespace is preserved.
    pub fn read_text(&mut self) -> Result<String, MarkupError> {
        let mut out = String::new();
        loop {
            self.fill()?;
            match self.pending.front() {
                Some((MarkupEvent::Text(_), _)) => {
                    if let Some((MarkupEvent::Text(text), _)) = self.pending.pop_front() {
                        out.push_str(&text);
                    }
                }
                _ => return Ok(out),
            }
        }
    }

    /// Consume the upcoming element and all of its content.
    pub fn skip_element(&mut self) -> Result<(), MarkupError> {
        self.skip_whitespace()?;
        let position = self.position();
        let target = self.open.len();
        match self.next_event()? {
            Some(MarkupEvent::Start(_)) => {}
            other => {
                return Err(MarkupError::Syntax {
                    message: format!("cannot skip {}", describe(other.as_ref())),
                    position,
                })
            }
        }
        while self.open.len() > target {
            if self.next_event()?.is_none() {
                return Err(MarkupError::UnexpectedEof {
                    position: self.position(),
                });
            }
        }
        Ok(())
    }

    fn fill(&mut self) -> Result<(), MarkupError> {
        while self.pending.is_empty() && !self.eof {
            let position = self.reader.buffer_position() as usize;
            let (resolved, event) =
                self.reader
                    .read_resolved_event()
                    .map_err(|e| MarkupError::Syntax {
                        message: e.to_string(),
                        position,
                    })?;
            let namespace = resolve_namespace(resolved, position)?;
            match event {
                Event::Start(e) => {
                    let start = self.start_element(&e, namespace, position)?;
                    self.pending.push_back((MarkupEvent::Start(start), position));
                }
                Event::Empty(e) => {
                    let start = self.start_element(&e, namespace, position)?;
                    let name = start.name.clone();
                    self.pending.push_back((MarkupEvent::Start(start), position));
                    self.pending.push_back((MarkupEvent::End(name), position));
                }
                Event::End(e) => {
                    let name = QName {
                        namespace,
                        local_name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                    };
                    self.pending.push_back((MarkupEvent::End(name), position));
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| MarkupError::Syntax {
                        message: e.to_string(),
                        position,
                    })?;
                    if !text.is_empty() {
                        self.pending
                            .push_back((MarkupEvent::Text(text.into_owned()), position));
                    }
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c).into_owned();
                    self.pending.push_back((MarkupEvent::Text(text), position));
                }
                Event::Eof => self.eof = true,
                // declarations, comments, processing instructions, doctype
                _ => {}
            }
        }
        Ok(())
    }

    fn start_element(
        &self,
        e: &BytesStart<'_>,
        namespace: Option<String>,
        position: usize,
    ) -> Result<StartElement, MarkupError> {
        let name = QName {
            namespace,
            local_name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
        };
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| MarkupError::Syntax {
                message: e.to_string(),
                position,
            })?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let (resolved, local) = self.reader.resolve_attribute(attr.key);
            let namespace = resolve_namespace(resolved, position)?;
            let local_name = String::from_utf8_lossy(local.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| MarkupError::Syntax {
                    message: e.to_string(),
                    position,
                })?
                .into_owned();
            attributes.push(Attribute {
                name: QName {
                    namespace,
                    local_name,
                },
                value,
            });
        }
        Ok(StartElement { name, attributes })
    }
}

fn resolve_namespace(
    resolved: ResolveResult<'_>,
    position: usize,
) -> Result<Option<String>, MarkupError> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(MarkupError::UnboundPrefix {
            prefix: String::from_utf8_lossy(&prefix).into_owned(),
            position,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_elements_expand_to_pairs() {
        let mut reader = MarkupReader::new("<a><b/></a>");
        let a = QName::local("a");
        let b = QName::local("b");
        reader.consume_start(&a).unwrap();
        reader.consume_start(&b).unwrap();
        reader.consume_end(&b).unwrap();
        reader.consume_end(&a).unwrap();
        assert!(reader.is_eof().unwrap());
    }

    #[test]
    fn whitespace_is_skipped_before_element_queries() {
        let mut reader = MarkupReader::new("<a>\n  <b>x</b>\n</a>");
        reader.consume_start(&QName::local("a")).unwrap();
        assert!(reader.is_start_of(&QName::local("b")).unwrap());
        reader.consume_start(&QName::local("b")).unwrap();
        assert_eq!(reader.read_text().unwrap(), "x");
        reader.consume_end(&QName::local("b")).unwrap();
        assert!(reader.is_end().unwrap());
    }

    #[test]
    fn namespaces_resolve_for_prefixed_and_default() {
        let doc = r#"<r xmlns="urn:a" xmlns:p="urn:b"><p:c k="v" p:q="w"/></r>"#;
        let mut reader = MarkupReader::new(doc);
        reader.consume_start(&QName::new(Some("urn:a"), "r")).unwrap();
        let c = reader.consume_start(&QName::new(Some("urn:b"), "c")).unwrap();
        assert_eq!(c.attribute(&QName::local("k")), Some("v"));
        assert_eq!(c.attribute(&QName::new(Some("urn:b"), "q")), Some("w"));
        assert_eq!(c.attributes.len(), 2);
    }

    #[test]
    fn mismatched_start_reports_found_event() {
        let mut reader = MarkupReader::new("<a/>");
        let err = reader.consume_start(&QName::local("b")).unwrap_err();
        match err {
            MarkupError::ExpectedStart { expected, found, .. } => {
                assert_eq!(expected, QName::local("b"));
                assert_eq!(found, "<a>");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn skip_element_consumes_nested_content() {
        let mut reader = MarkupReader::new("<r><x><y>1</y><y/></x><z/></r>");
        reader.consume_start(&QName::local("r")).unwrap();
        reader.skip_element().unwrap();
        assert!(reader.is_start_of(&QName::local("z")).unwrap());
    }

    #[test]
    fn parent_tracks_open_elements() {
        let mut reader = MarkupReader::new(r#"<r xmlns="urn:a"><c/></r>"#);
        assert_eq!(reader.parent(), None);
        let r = QName::new(Some("urn:a"), "r");
        let c = QName::new(Some("urn:a"), "c");
        reader.consume_start(&r).unwrap();
        reader.consume_start(&c).unwrap();
        assert_eq!(reader.parent(), Some(&c));
        reader.consume_end(&c).unwrap();
        assert_eq!(reader.parent(), Some(&r));
    }

    #[test]
    fn entities_and_cdata_become_text() {
        let mut reader = MarkupReader::new("<a>1 &lt; 2<![CDATA[ & 3]]></a>");
        reader.consume_start(&QName::local("a")).unwrap();
        assert_eq!(reader.read_text().unwrap(), "1 < 2 & 3");
    }
}
