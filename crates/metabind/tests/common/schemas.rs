#![allow(dead_code)]

use std::sync::Arc;

use metabind::{
    BindingContext, BoundItem, ClassDefinition, GroupAs, IntegerAdapter, JsonGroupAs,
    JsonValueKey, MaxOccurs, PropertyDefinition, ScalarAdapter, ScalarValue, ValueError,
};

pub const NS: &str = "urn:catalog";

/// An integer that may also appear as bare text under its parent.
#[derive(Debug)]
pub struct LooseInteger;

impl ScalarAdapter for LooseInteger {
    fn id(&self) -> &str {
        "loose-integer"
    }

    fn parse(&self, text: &str) -> Result<ScalarValue, ValueError> {
        IntegerAdapter.parse(text)
    }

    fn to_text(&self, value: &ScalarValue) -> Result<String, ValueError> {
        IntegerAdapter.to_text(value)
    }

    fn parse_json(&self, value: &serde_json::Value) -> Result<ScalarValue, ValueError> {
        IntegerAdapter.parse_json(value)
    }

    fn to_json(&self, value: &ScalarValue) -> Result<serde_json::Value, ValueError> {
        IntegerAdapter.to_json(value)
    }

    fn is_unwrapped_value_allowed_in_xml(&self) -> bool {
        true
    }
}

pub fn entry_class() -> ClassDefinition {
    ClassDefinition::assembly("entry")
        .namespace(NS)
        .with_flag(PropertyDefinition::flag("key"))
        .with_property(PropertyDefinition::field("v", "integer"))
        .json_key("key")
}

pub fn measure_class() -> ClassDefinition {
    ClassDefinition::field("measure", "decimal")
        .namespace(NS)
        .with_flag(PropertyDefinition::flag("unit"))
        .json_value_key(JsonValueKey::Flag("unit".into()))
}

pub fn part_class() -> ClassDefinition {
    ClassDefinition::assembly("part")
        .namespace(NS)
        .with_flag(PropertyDefinition::flag("name"))
        .with_property(
            PropertyDefinition::assembly("part", "part")
                .occurs(0, MaxOccurs::Unbounded)
                .group_as(GroupAs::new("parts").grouped()),
        )
}

pub fn catalog_class() -> ClassDefinition {
    ClassDefinition::assembly("catalog")
        .namespace(NS)
        .root("catalog")
        .with_flag(PropertyDefinition::flag("id").adapter("token"))
        .with_property(PropertyDefinition::field("title", "string").required())
        .with_property(
            PropertyDefinition::field("tag", "string")
                .occurs(0, MaxOccurs::Unbounded)
                .group_as(GroupAs::new("tags").grouped()),
        )
        .with_property(PropertyDefinition::field("note", "markup-multiline").unwrapped())
        .with_property(
            PropertyDefinition::assembly("entry", "entry")
                .occurs(0, MaxOccurs::Unbounded)
                .group_as(GroupAs::new("entries").keyed()),
        )
        .with_property(PropertyDefinition::field_class("measure", "measure"))
        .with_property(
            PropertyDefinition::field("alias", "string")
                .occurs(0, MaxOccurs::Unbounded)
                .group_as(GroupAs::new("aliases").json(JsonGroupAs::SingletonOrList)),
        )
        .with_property(
            PropertyDefinition::assembly("part", "part")
                .occurs(0, MaxOccurs::Unbounded)
                .group_as(GroupAs::new("parts").grouped()),
        )
}

pub fn catalog_context() -> BindingContext {
    BindingContext::new()
        .with_class(catalog_class())
        .with_class(entry_class())
        .with_class(measure_class())
        .with_class(part_class())
}

pub const CATALOG_XML: &str = r#"<?xml version="1.0"?>
<catalog xmlns="urn:catalog" id="c1">
  <title>Parts &amp; pieces</title>
  <tags>
    <tag>a</tag>
    <tag>b</tag>
  </tags>
  <p>Hello <em>there</em></p>
  <entry key="x"><v>1</v></entry>
  <entry key="y">
    <v>2</v>
  </entry>
  <measure unit="kg">2.5</measure>
  <alias>one</alias>
  <parts>
    <part name="outer">
      <parts><part name="inner"/></parts>
    </part>
  </parts>
</catalog>
"#;

pub const CATALOG_XML_COMPACT: &str = concat!(
    r#"<catalog xmlns="urn:catalog" id="c1">"#,
    "<title>Parts &amp; pieces</title>",
    "<tags><tag>a</tag><tag>b</tag></tags>",
    "<p>Hello <em>there</em></p>",
    r#"<entry key="x"><v>1</v></entry>"#,
    r#"<entry key="y"><v>2</v></entry>"#,
    r#"<measure unit="kg">2.5</measure>"#,
    "<alias>one</alias>",
    r#"<parts><part name="outer"><parts><part name="inner"></part></parts></part></parts>"#,
    "</catalog>",
);

pub const CATALOG_JSON: &str = concat!(
    r#"{"catalog":{"id":"c1","title":"Parts & pieces","tags":["a","b"],"#,
    r#""note":"<p>Hello <em>there</em></p>","#,
    r#""entries":{"x":{"v":1},"y":{"v":2}},"#,
    r#""measure":{"kg":2.5},"aliases":"one","#,
    r#""parts":[{"name":"outer","parts":[{"name":"inner"}]}]}}"#,
);

/// A document root holding one keyed collection of entries.
pub fn keyed_context() -> BindingContext {
    BindingContext::new()
        .with_class(
            ClassDefinition::assembly("doc").root("doc").with_property(
                PropertyDefinition::assembly("item", "entry")
                    .occurs(0, MaxOccurs::Unbounded)
                    .group_as(GroupAs::new("items").keyed()),
            ),
        )
        .with_class(
            ClassDefinition::assembly("entry")
                .with_flag(PropertyDefinition::flag("key"))
                .with_property(PropertyDefinition::field("v", "integer"))
                .json_key("key"),
        )
}

/// A document root with a grouped list of string tags.
pub fn tags_context() -> BindingContext {
    BindingContext::new().with_class(
        ClassDefinition::assembly("doc").root("doc").with_property(
            PropertyDefinition::field("tag", "string")
                .occurs(0, MaxOccurs::Unbounded)
                .group_as(GroupAs::new("tags").grouped()),
        ),
    )
}

pub fn loose_context() -> BindingContext {
    BindingContext::new()
        .with_adapter(Arc::new(LooseInteger))
        .with_class(
            ClassDefinition::assembly("parent")
                .root("parent")
                .with_property(PropertyDefinition::field("value", "loose-integer").unwrapped()),
        )
}

pub fn strings(items: &[&str]) -> Vec<BoundItem> {
    items.iter().map(|s| BoundItem::string(*s)).collect()
}
