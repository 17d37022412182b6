//! Scalar type adapters: parse, serialize and copy primitive values.

mod builtin;

pub use builtin::{
    BooleanAdapter, DecimalAdapter, IntegerAdapter, MarkupLineAdapter, MarkupMultilineAdapter,
    NonNegativeIntegerAdapter, StringAdapter, TokenAdapter,
};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use metabind_io::markup::{MarkupError, MarkupEvent, MarkupReader};
use metabind_io::QName;
use serde_json::Value;

use crate::error::ValueError;
use crate::value::ScalarValue;

/// How a scalar is emitted as element content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupContent {
    /// Character data, escaped on write.
    Text(String),
    /// Already-serialized markup, written verbatim.
    Raw(String),
}

pub trait ScalarAdapter: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;

    fn parse(&self, text: &str) -> Result<ScalarValue, ValueError>;

    fn to_text(&self, value: &ScalarValue) -> Result<String, ValueError>;

    fn parse_json(&self, value: &Value) -> Result<ScalarValue, ValueError> {
        match value {
            Value::String(s) => self.parse(s),
            Value::Number(n) => self.parse(&n.to_string()),
            Value::Bool(b) => self.parse(if *b { "true" } else { "false" }),
            other => Err(ValueError::new(self.id(), other.to_string(), "not a scalar")),
        }
    }

    fn to_json(&self, value: &ScalarValue) -> Result<Value, ValueError> {
        Ok(Value::String(self.to_text(value)?))
    }

    fn copy(&self, value: &ScalarValue) -> ScalarValue {
        value.clone()
    }

    /// Label of a field-class value in key/value documents.
    fn default_json_value_key(&self) -> &str {
        "STRVALUE"
    }

    /// Whether values may appear directly under the parent element.
    fn is_unwrapped_value_allowed_in_xml(&self) -> bool {
        false
    }

    /// Whether an unwrapped value may start with an element of this name,
    /// found directly under `parent`.
    fn can_handle_qname(&self, _name: &QName, _parent: Option<&QName>) -> bool {
        false
    }

    /// Read raw content from the markup stream.
    ///
    /// Wrapped: the cursor is inside the value's element; consume everything
    /// up to (not including) its end tag. Unwrapped: consume only content
    /// this adapter claims and return `None` when there is none.
    fn read_markup(
        &self,
        reader: &mut MarkupReader<'_>,
        unwrapped: bool,
    ) -> Result<Option<String>, MarkupError> {
        if unwrapped {
            match reader.peek()? {
                Some(event @ MarkupEvent::Text(_)) if !event.is_whitespace() => {}
                _ => return Ok(None),
            }
        }
        reader.read_text().map(Some)
    }

    fn markup_content(&self, value: &ScalarValue) -> Result<MarkupContent, ValueError> {
        Ok(MarkupContent::Text(self.to_text(value)?))
    }
}

/// Adapters by id.
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn ScalarAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl AdapterRegistry {
    fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(StringAdapter));
        registry.register(Arc::new(TokenAdapter));
        registry.register(Arc::new(IntegerAdapter));
        registry.register(Arc::new(NonNegativeIntegerAdapter));
        registry.register(Arc::new(DecimalAdapter));
        registry.register(Arc::new(BooleanAdapter));
        registry.register(Arc::new(MarkupLineAdapter));
        registry.register(Arc::new(MarkupMultilineAdapter));
        registry
    }

    /// Register an adapter, replacing any adapter with the same id.
    pub fn register(&mut self, adapter: Arc<dyn ScalarAdapter>) {
        self.adapters.insert(adapter.id().to_string(), adapter);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn ScalarAdapter>> {
        self.adapters.get(id)
    }
}
