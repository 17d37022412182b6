use serde::{Deserialize, Serialize};

/// What to do with document content no property claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownFields {
    /// Log a warning and skip the element or value.
    #[default]
    Skip,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReadOptions {
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WriteOptions {
    /// Spaces per nesting level; `None` writes compact output.
    pub indent: Option<usize>,
    /// Emit an XML declaration before the root element.
    pub xml_declaration: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BindingOptions {
    pub read: ReadOptions,
    pub write: WriteOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_kebab_case() {
        let options: BindingOptions = serde_json::from_value(serde_json::json!({
            "read": { "unknown-fields": "error" },
            "write": { "indent": 2 }
        }))
        .unwrap();
        assert_eq!(options.read.unknown_fields, UnknownFields::Error);
        assert_eq!(options.write.indent, Some(2));
        assert!(!options.write.xml_declaration);
    }

    #[test]
    fn empty_document_is_default() {
        let options: BindingOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, BindingOptions::default());
    }
}
