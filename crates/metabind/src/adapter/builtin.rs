use metabind_io::markup::{events_to_string, MarkupError, MarkupEvent, MarkupReader};
use metabind_io::QName;
use serde_json::{Number, Value};

use super::{MarkupContent, ScalarAdapter};
use crate::error::ValueError;
use crate::value::ScalarValue;

fn mismatch(adapter: &str, value: &ScalarValue) -> ValueError {
    ValueError::new(adapter, value.to_string(), "value has the wrong scalar type")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringAdapter;

impl ScalarAdapter for StringAdapter {
    fn id(&self) -> &str {
        "string"
    }

    fn parse(&self, text: &str) -> Result<ScalarValue, ValueError> {
        Ok(ScalarValue::String(text.to_string()))
    }

    fn to_text(&self, value: &ScalarValue) -> Result<String, ValueError> {
        match value {
            ScalarValue::String(s) => Ok(s.clone()),
            other => Err(mismatch(self.id(), other)),
        }
    }
}

/// A non-empty string without whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenAdapter;

impl ScalarAdapter for TokenAdapter {
    fn id(&self) -> &str {
        "token"
    }

    fn parse(&self, text: &str) -> Result<ScalarValue, ValueError> {
        let token = text.trim();
        if token.is_empty() {
            return Err(ValueError::new(self.id(), text, "empty token"));
        }
        if token.chars().any(char::is_whitespace) {
            return Err(ValueError::new(self.id(), text, "contains whitespace"));
        }
        Ok(ScalarValue::String(token.to_string()))
    }

    fn to_text(&self, value: &ScalarValue) -> Result<String, ValueError> {
        match value {
            ScalarValue::String(s) => Ok(s.clone()),
            other => Err(mismatch(self.id(), other)),
        }
    }
}

fn parse_integer(adapter: &str, text: &str) -> Result<i64, ValueError> {
    text.trim()
        .parse::<i64>()
        .map_err(|e| ValueError::new(adapter, text, e.to_string()))
}

fn integer_from_json(adapter: &str, value: &Value) -> Result<i64, ValueError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| ValueError::new(adapter, n.to_string(), "not an integer")),
        Value::String(s) => parse_integer(adapter, s),
        other => Err(ValueError::new(adapter, other.to_string(), "not a number")),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerAdapter;

impl ScalarAdapter for IntegerAdapter {
    fn id(&self) -> &str {
        "integer"
    }

    fn parse(&self, text: &str) -> Result<ScalarValue, ValueError> {
        parse_integer(self.id(), text).map(ScalarValue::Integer)
    }

    fn to_text(&self, value: &ScalarValue) -> Result<String, ValueError> {
        match value {
            ScalarValue::Integer(i) => Ok(i.to_string()),
            other => Err(mismatch(self.id(), other)),
        }
    }

    fn parse_json(&self, value: &Value) -> Result<ScalarValue, ValueError> {
        integer_from_json(self.id(), value).map(ScalarValue::Integer)
    }

    fn to_json(&self, value: &ScalarValue) -> Result<Value, ValueError> {
        match value {
            ScalarValue::Integer(i) => Ok(Value::from(*i)),
            other => Err(mismatch(self.id(), other)),
        }
    }

    fn default_json_value_key(&self) -> &str {
        "NUMVALUE"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NonNegativeIntegerAdapter;

impl NonNegativeIntegerAdapter {
    fn check(&self, text: &str, i: i64) -> Result<ScalarValue, ValueError> {
        if i < 0 {
            return Err(ValueError::new(self.id(), text, "negative"));
        }
        Ok(ScalarValue::Integer(i))
    }
}

impl ScalarAdapter for NonNegativeIntegerAdapter {
    fn id(&self) -> &str {
        "non-negative-integer"
    }

    fn parse(&self, text: &str) -> Result<ScalarValue, ValueError> {
        let i = parse_integer(self.id(), text)?;
        self.check(text, i)
    }

    fn to_text(&self, value: &ScalarValue) -> Result<String, ValueError> {
        match value {
            ScalarValue::Integer(i) if *i >= 0 => Ok(i.to_string()),
            other => Err(mismatch(self.id(), other)),
        }
    }

    fn parse_json(&self, value: &Value) -> Result<ScalarValue, ValueError> {
        let i = integer_from_json(self.id(), value)?;
        self.check(&value.to_string(), i)
    }

    fn to_json(&self, value: &ScalarValue) -> Result<Value, ValueError> {
        match value {
            ScalarValue::Integer(i) if *i >= 0 => Ok(Value::from(*i)),
            other => Err(mismatch(self.id(), other)),
        }
    }

    fn default_json_value_key(&self) -> &str {
        "NUMVALUE"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalAdapter;

impl ScalarAdapter for DecimalAdapter {
    fn id(&self) -> &str {
        "decimal"
    }

    fn parse(&self, text: &str) -> Result<ScalarValue, ValueError> {
        let d = text
            .trim()
            .parse::<f64>()
            .map_err(|e| ValueError::new(self.id(), text, e.to_string()))?;
        if !d.is_finite() {
            return Err(ValueError::new(self.id(), text, "not a finite number"));
        }
        Ok(ScalarValue::Decimal(d))
    }

    fn to_text(&self, value: &ScalarValue) -> Result<String, ValueError> {
        match value {
            ScalarValue::Decimal(d) => Ok(d.to_string()),
            other => Err(mismatch(self.id(), other)),
        }
    }

    fn parse_json(&self, value: &Value) -> Result<ScalarValue, ValueError> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(ScalarValue::Decimal)
                .ok_or_else(|| ValueError::new(self.id(), n.to_string(), "out of range")),
            Value::String(s) => self.parse(s),
            other => Err(ValueError::new(self.id(), other.to_string(), "not a number")),
        }
    }

    fn to_json(&self, value: &ScalarValue) -> Result<Value, ValueError> {
        match value {
            ScalarValue::Decimal(d) => Number::from_f64(*d)
                .map(Value::Number)
                .ok_or_else(|| ValueError::new(self.id(), d.to_string(), "not a finite number")),
            other => Err(mismatch(self.id(), other)),
        }
    }

    fn default_json_value_key(&self) -> &str {
        "NUMVALUE"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanAdapter;

impl ScalarAdapter for BooleanAdapter {
    fn id(&self) -> &str {
        "boolean"
    }

    fn parse(&self, text: &str) -> Result<ScalarValue, ValueError> {
        match text.trim() {
            "true" | "1" => Ok(ScalarValue::Boolean(true)),
            "false" | "0" => Ok(ScalarValue::Boolean(false)),
            _ => Err(ValueError::new(self.id(), text, "expected true, false, 1 or 0")),
        }
    }

    fn to_text(&self, value: &ScalarValue) -> Result<String, ValueError> {
        match value {
            ScalarValue::Boolean(b) => Ok(b.to_string()),
            other => Err(mismatch(self.id(), other)),
        }
    }

    fn parse_json(&self, value: &Value) -> Result<ScalarValue, ValueError> {
        match value {
            Value::Bool(b) => Ok(ScalarValue::Boolean(*b)),
            Value::String(s) => self.parse(s),
            other => Err(ValueError::new(self.id(), other.to_string(), "not a boolean")),
        }
    }

    fn to_json(&self, value: &ScalarValue) -> Result<Value, ValueError> {
        match value {
            ScalarValue::Boolean(b) => Ok(Value::Bool(*b)),
            other => Err(mismatch(self.id(), other)),
        }
    }

    fn default_json_value_key(&self) -> &str {
        "BOOLVALUE"
    }
}

/// Collect the events of the current element's content, leaving its end tag.
fn collect_content(reader: &mut MarkupReader<'_>) -> Result<Vec<MarkupEvent>, MarkupError> {
    let mut events = Vec::new();
    let mut depth = 0usize;
    loop {
        if depth == 0 && matches!(reader.peek()?, Some(MarkupEvent::End(_))) {
            return Ok(events);
        }
        let position = reader.position();
        let event = reader
            .next_event()?
            .ok_or(MarkupError::UnexpectedEof { position })?;
        match &event {
            MarkupEvent::Start(_) => depth += 1,
            MarkupEvent::End(_) => depth -= 1,
            MarkupEvent::Text(_) => {}
        }
        events.push(event);
    }
}

/// Collect the upcoming element with all of its content.
fn collect_element(reader: &mut MarkupReader<'_>) -> Result<Vec<MarkupEvent>, MarkupError> {
    let position = reader.position();
    let start = reader
        .next_event()?
        .ok_or(MarkupError::UnexpectedEof { position })?;
    let mut events = vec![start];
    events.extend(collect_content(reader)?);
    let position = reader.position();
    let end = reader
        .next_event()?
        .ok_or(MarkupError::UnexpectedEof { position })?;
    events.push(end);
    Ok(events)
}

/// Drop whitespace-only text between top-level blocks.
fn strip_block_whitespace(events: Vec<MarkupEvent>) -> Vec<MarkupEvent> {
    let mut depth = 0usize;
    events
        .into_iter()
        .filter(|event| {
            let keep = depth > 0 || !event.is_whitespace();
            match event {
                MarkupEvent::Start(_) => depth += 1,
                MarkupEvent::End(_) => depth = depth.saturating_sub(1),
                MarkupEvent::Text(_) => {}
            }
            keep
        })
        .collect()
}

fn markup_text(adapter: &str, value: &ScalarValue) -> Result<String, ValueError> {
    match value {
        ScalarValue::Markup(s) | ScalarValue::String(s) => Ok(s.clone()),
        other => Err(mismatch(adapter, other)),
    }
}

/// Single-line rich text: character data with inline elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupLineAdapter;

impl ScalarAdapter for MarkupLineAdapter {
    fn id(&self) -> &str {
        "markup-line"
    }

    fn parse(&self, text: &str) -> Result<ScalarValue, ValueError> {
        Ok(ScalarValue::Markup(text.to_string()))
    }

    fn to_text(&self, value: &ScalarValue) -> Result<String, ValueError> {
        markup_text(self.id(), value)
    }

    fn default_json_value_key(&self) -> &str {
        "RICHTEXT"
    }

    fn read_markup(
        &self,
        reader: &mut MarkupReader<'_>,
        unwrapped: bool,
    ) -> Result<Option<String>, MarkupError> {
        if unwrapped {
            return Ok(None);
        }
        Ok(Some(events_to_string(&collect_content(reader)?)))
    }

    fn markup_content(&self, value: &ScalarValue) -> Result<MarkupContent, ValueError> {
        Ok(MarkupContent::Raw(self.to_text(value)?))
    }
}

const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

const BLOCK_ELEMENTS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "pre",
    "blockquote",
    "table",
    "hr",
];

/// Multi-line rich text made of block elements. May appear unwrapped,
/// in which case it claims the block elements directly under the parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupMultilineAdapter;

impl ScalarAdapter for MarkupMultilineAdapter {
    fn id(&self) -> &str {
        "markup-multiline"
    }

    fn parse(&self, text: &str) -> Result<ScalarValue, ValueError> {
        Ok(ScalarValue::Markup(text.to_string()))
    }

    fn to_text(&self, value: &ScalarValue) -> Result<String, ValueError> {
        markup_text(self.id(), value)
    }

    fn default_json_value_key(&self) -> &str {
        "PROSE"
    }

    fn is_unwrapped_value_allowed_in_xml(&self) -> bool {
        true
    }

    /// Block elements in the parent's namespace or in XHTML.
    fn can_handle_qname(&self, name: &QName, parent: Option<&QName>) -> bool {
        let ns = name.namespace.as_deref();
        let in_scope = ns == Some(XHTML_NS) || ns == parent.and_then(|p| p.namespace.as_deref());
        in_scope && BLOCK_ELEMENTS.contains(&name.local_name.as_str())
    }

    fn read_markup(
        &self,
        reader: &mut MarkupReader<'_>,
        unwrapped: bool,
    ) -> Result<Option<String>, MarkupError> {
        if !unwrapped {
            let events = strip_block_whitespace(collect_content(reader)?);
            return Ok(Some(events_to_string(&events)));
        }
        let parent = reader.parent().cloned();
        let mut events = Vec::new();
        while reader
            .peek_start()?
            .is_some_and(|start| self.can_handle_qname(&start.name, parent.as_ref()))
        {
            events.extend(collect_element(reader)?);
        }
        if events.is_empty() {
            return Ok(None);
        }
        Ok(Some(events_to_string(&events)))
    }

    fn markup_content(&self, value: &ScalarValue) -> Result<MarkupContent, ValueError> {
        Ok(MarkupContent::Raw(self.to_text(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_trim_and_reject_garbage() {
        assert_eq!(IntegerAdapter.parse(" 42 ").unwrap(), ScalarValue::Integer(42));
        assert!(IntegerAdapter.parse("4x").is_err());
        assert!(NonNegativeIntegerAdapter.parse("-1").is_err());
        assert_eq!(
            NonNegativeIntegerAdapter.parse_json(&serde_json::json!(3)).unwrap(),
            ScalarValue::Integer(3)
        );
    }

    #[test]
    fn numeric_json_is_native() {
        assert_eq!(
            IntegerAdapter.to_json(&ScalarValue::Integer(7)).unwrap(),
            serde_json::json!(7)
        );
        assert_eq!(
            BooleanAdapter.to_json(&ScalarValue::Boolean(true)).unwrap(),
            serde_json::json!(true)
        );
        assert!(IntegerAdapter.to_json(&ScalarValue::from("7")).is_err());
    }

    #[test]
    fn token_rejects_inner_whitespace() {
        assert_eq!(TokenAdapter.parse(" abc ").unwrap(), ScalarValue::from("abc"));
        assert!(TokenAdapter.parse("a b").is_err());
        assert!(TokenAdapter.parse("  ").is_err());
    }

    #[test]
    fn decimal_rejects_non_finite() {
        assert_eq!(DecimalAdapter.parse("1.5").unwrap(), ScalarValue::Decimal(1.5));
        assert!(DecimalAdapter.parse("NaN").is_err());
    }

    #[test]
    fn booleans_accept_digits() {
        assert_eq!(BooleanAdapter.parse("1").unwrap(), ScalarValue::Boolean(true));
        assert_eq!(BooleanAdapter.parse("false").unwrap(), ScalarValue::Boolean(false));
        assert!(BooleanAdapter.parse("yes").is_err());
    }

    #[test]
    fn markup_line_keeps_inline_elements() {
        let mut reader = MarkupReader::new("<title>A <em>big</em> deal</title>");
        reader.consume_start(&QName::local("title")).unwrap();
        let text = MarkupLineAdapter.read_markup(&mut reader, false).unwrap();
        assert_eq!(text.as_deref(), Some("A <em>big</em> deal"));
        reader.consume_end(&QName::local("title")).unwrap();
    }

    #[test]
    fn unwrapped_multiline_claims_only_blocks() {
        let mut reader = MarkupReader::new("<part><p>one</p>\n<p>two</p><name>x</name></part>");
        reader.consume_start(&QName::local("part")).unwrap();
        let text = MarkupMultilineAdapter.read_markup(&mut reader, true).unwrap();
        assert_eq!(text.as_deref(), Some("<p>one</p><p>two</p>"));
        assert!(reader.is_start_of(&QName::local("name")).unwrap());
    }

    #[test]
    fn unwrapped_multiline_without_blocks_is_absent() {
        let mut reader = MarkupReader::new("<part><name>x</name></part>");
        reader.consume_start(&QName::local("part")).unwrap();
        assert_eq!(MarkupMultilineAdapter.read_markup(&mut reader, true).unwrap(), None);
    }

    #[test]
    fn unwrapped_multiline_ignores_foreign_blocks() {
        let doc = r#"<part xmlns="urn:a" xmlns:x="urn:x"><x:p>one</x:p></part>"#;
        let mut reader = MarkupReader::new(doc);
        reader.consume_start(&QName::new(Some("urn:a"), "part")).unwrap();
        assert_eq!(MarkupMultilineAdapter.read_markup(&mut reader, true).unwrap(), None);
        assert!(reader.is_start_of(&QName::new(Some("urn:x"), "p")).unwrap());
    }

    #[test]
    fn unwrapped_multiline_accepts_xhtml_blocks() {
        let doc = r#"<part xmlns="urn:a" xmlns:h="http://www.w3.org/1999/xhtml"><h:p>one</h:p></part>"#;
        let mut reader = MarkupReader::new(doc);
        reader.consume_start(&QName::new(Some("urn:a"), "part")).unwrap();
        assert!(MarkupMultilineAdapter.read_markup(&mut reader, true).unwrap().is_some());
        assert!(reader.is_end().unwrap());
    }

    #[test]
    fn unwrapped_text_is_claimed_by_default() {
        let mut reader = MarkupReader::new("<v>42</v>");
        reader.consume_start(&QName::local("v")).unwrap();
        assert_eq!(
            IntegerAdapter.read_markup(&mut reader, true).unwrap().as_deref(),
            Some("42")
        );
        assert!(reader.is_end().unwrap());
    }
}
