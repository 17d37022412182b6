mod common;

use metabind::{
    BindingContext, BindingOptions, BoundItem, ClassDefinition, CodecError, DocumentError,
    MaxOccurs, MemberValue, PropertyDefinition, ScalarValue, UnknownFields,
};
use indexmap::IndexMap;
use metabind_io::MarkupError;

use common::schemas::{
    catalog_context, keyed_context, loose_context, strings, tags_context, CATALOG_XML,
    CATALOG_XML_COMPACT,
};

#[test]
fn grouped_list_reads_items_in_order() {
    let ctx = tags_context();
    let doc = ctx
        .read_xml("doc", "<doc><tags><tag>a</tag><tag>b</tag></tags></doc>")
        .unwrap();
    let binding = ctx.class_binding("doc").unwrap();
    assert_eq!(
        binding.get(&doc, "tag").unwrap(),
        Some(&MemberValue::List(strings(&["a", "b"])))
    );
    assert_eq!(
        ctx.write_xml(&doc).unwrap(),
        "<doc><tags><tag>a</tag><tag>b</tag></tags></doc>"
    );
}

#[test]
fn whitespace_between_elements_is_not_content() {
    let ctx = tags_context();
    let doc = ctx
        .read_xml("doc", "<doc>\n  <tags>\n    <tag>a</tag>\n  </tags>\n</doc>\n")
        .unwrap();
    let binding = ctx.class_binding("doc").unwrap();
    assert_eq!(
        binding.get(&doc, "tag").unwrap(),
        Some(&MemberValue::List(strings(&["a"])))
    );
}

#[test]
fn empty_list_writes_no_group_element() {
    let ctx = tags_context();
    let binding = ctx.class_binding("doc").unwrap();
    let mut doc = binding.new_instance();
    binding
        .set(&mut doc, "tag", Some(MemberValue::List(Vec::new())))
        .unwrap();
    assert_eq!(ctx.write_xml(&doc).unwrap(), "<doc></doc>");

    let back = ctx.read_xml("doc", "<doc></doc>").unwrap();
    assert_eq!(binding.get(&back, "tag").unwrap(), None);
}

#[test]
fn empty_group_element_reads_as_absent() {
    let ctx = tags_context();
    let doc = ctx.read_xml("doc", "<doc><tags/></doc>").unwrap();
    let binding = ctx.class_binding("doc").unwrap();
    assert_eq!(binding.get(&doc, "tag").unwrap(), None);
}

#[test]
fn unwrapped_scalar_is_read_from_parent_text() {
    let ctx = loose_context();
    let parent = ctx.read_xml("parent", "<parent>42</parent>").unwrap();
    let binding = ctx.class_binding("parent").unwrap();
    assert_eq!(
        binding.get(&parent, "value").unwrap(),
        Some(&MemberValue::Single(BoundItem::Scalar(ScalarValue::Integer(42))))
    );
    assert_eq!(ctx.write_xml(&parent).unwrap(), "<parent>42</parent>");
}

#[test]
fn unwrapping_needs_adapter_support() {
    let ctx = BindingContext::new().with_class(
        ClassDefinition::assembly("parent")
            .root("parent")
            .with_property(PropertyDefinition::field("value", "integer").unwrapped()),
    );
    let binding = ctx.class_binding("parent").unwrap();
    let mut parent = binding.new_instance();
    binding
        .set(
            &mut parent,
            "value",
            Some(MemberValue::Single(BoundItem::Scalar(ScalarValue::Integer(7)))),
        )
        .unwrap();
    assert_eq!(
        ctx.write_xml(&parent).unwrap(),
        "<parent><value>7</value></parent>"
    );
}

#[test]
fn catalog_reads_every_shape() {
    let ctx = catalog_context();
    let catalog = ctx.read_xml("catalog", CATALOG_XML).unwrap();
    let binding = ctx.class_binding("catalog").unwrap();

    assert_eq!(
        binding.get(&catalog, "id").unwrap(),
        Some(&MemberValue::Single(BoundItem::string("c1")))
    );
    assert_eq!(
        binding.get(&catalog, "title").unwrap(),
        Some(&MemberValue::Single(BoundItem::string("Parts & pieces")))
    );
    assert_eq!(
        binding.get(&catalog, "note").unwrap(),
        Some(&MemberValue::Single(BoundItem::Scalar(ScalarValue::Markup(
            "<p>Hello <em>there</em></p>".into()
        ))))
    );

    let Some(MemberValue::Map(entries)) = binding.get(&catalog, "entry").unwrap() else {
        panic!("entries should be a map");
    };
    assert_eq!(entries.keys().collect::<Vec<_>>(), ["x", "y"]);

    let Some(MemberValue::Single(BoundItem::Object(measure))) =
        binding.get(&catalog, "measure").unwrap()
    else {
        panic!("measure should be an object");
    };
    assert_eq!(measure.value(), Some(&ScalarValue::Decimal(2.5)));

    let Some(MemberValue::List(parts)) = binding.get(&catalog, "part").unwrap() else {
        panic!("parts should be a list");
    };
    let part = ctx.class_binding("part").unwrap();
    let outer = parts[0].as_object().unwrap();
    let Some(MemberValue::List(inner)) = part.get(outer, "part").unwrap() else {
        panic!("outer part should hold parts");
    };
    assert_eq!(
        part.get(inner[0].as_object().unwrap(), "name").unwrap(),
        Some(&MemberValue::Single(BoundItem::string("inner")))
    );
}

#[test]
fn catalog_writes_compact_markup() {
    let ctx = catalog_context();
    let catalog = ctx.read_xml("catalog", CATALOG_XML).unwrap();
    assert_eq!(ctx.write_xml(&catalog).unwrap(), CATALOG_XML_COMPACT);
}

#[test]
fn catalog_round_trips() {
    let ctx = catalog_context();
    let catalog = ctx.read_xml("catalog", CATALOG_XML).unwrap();
    let again = ctx.read_xml("catalog", &ctx.write_xml(&catalog).unwrap()).unwrap();
    assert_eq!(again, catalog);
}

#[test]
fn prefixed_elements_match_by_namespace() {
    let ctx = catalog_context();
    let input = r#"<c:catalog xmlns:c="urn:catalog"><c:title>t</c:title></c:catalog>"#;
    let catalog = ctx.read_xml("catalog", input).unwrap();
    let binding = ctx.class_binding("catalog").unwrap();
    assert_eq!(
        binding.get(&catalog, "title").unwrap(),
        Some(&MemberValue::Single(BoundItem::string("t")))
    );
}

#[test]
fn wrong_namespace_root_is_rejected() {
    let ctx = catalog_context();
    let err = ctx
        .read_xml("catalog", r#"<catalog xmlns="urn:other"/>"#)
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::Document(DocumentError::Markup(MarkupError::ExpectedStart { .. }))
    ));
}

#[test]
fn stray_child_inside_scalar_is_expected_end() {
    let ctx = tags_context();
    let err = ctx
        .read_xml("doc", "<doc><tags><tag>a<b/></tag></tags></doc>")
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::Document(DocumentError::Markup(MarkupError::ExpectedEnd { .. }))
    ));
}

#[test]
fn unknown_element_inside_group_is_expected_end() {
    let ctx = tags_context();
    let err = ctx
        .read_xml("doc", "<doc><tags><tag>a</tag><label/></tags></doc>")
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::Document(DocumentError::Markup(MarkupError::ExpectedEnd { .. }))
    ));
}

#[test]
fn unknown_elements_are_skipped_by_default() {
    let ctx = tags_context();
    let doc = ctx
        .read_xml("doc", "<doc><extra><deep/></extra><tags><tag>a</tag></tags></doc>")
        .unwrap();
    let binding = ctx.class_binding("doc").unwrap();
    assert_eq!(
        binding.get(&doc, "tag").unwrap(),
        Some(&MemberValue::List(strings(&["a"])))
    );
}

#[test]
fn unknown_elements_can_be_errors() {
    let mut options = BindingOptions::default();
    options.read.unknown_fields = UnknownFields::Error;
    let ctx = BindingContext::with_options(options).with_class(
        ClassDefinition::assembly("doc")
            .root("doc")
            .with_property(PropertyDefinition::field("title", "string")),
    );
    let err = ctx.read_xml("doc", "<doc><extra/></doc>").unwrap_err();
    assert!(matches!(
        err,
        CodecError::Document(DocumentError::UnexpectedContent { .. })
    ));
}

#[test]
fn bad_scalar_reports_property_and_position() {
    let ctx = BindingContext::new().with_class(
        ClassDefinition::assembly("doc")
            .root("doc")
            .with_property(PropertyDefinition::field("count", "integer")),
    );
    let err = ctx.read_xml("doc", "<doc><count>x1</count></doc>").unwrap_err();
    let CodecError::Value { name, source, .. } = err else {
        panic!("expected a value error, got {err:?}");
    };
    assert_eq!(name, "count");
    assert_eq!(source.adapter, "integer");
}

#[test]
fn trailing_content_is_rejected() {
    let ctx = tags_context();
    let err = ctx.read_xml("doc", "<doc/><doc/>").unwrap_err();
    assert!(matches!(
        err,
        CodecError::Document(DocumentError::UnexpectedContent { .. })
    ));
}

#[test]
fn ungrouped_list_repeats_inline() {
    let ctx = BindingContext::new().with_class(
        ClassDefinition::assembly("doc").root("doc").with_property(
            PropertyDefinition::field("line", "string").occurs(0, MaxOccurs::Unbounded),
        ),
    );
    let input = "<doc><line>1</line><line>2</line><line>1</line></doc>";
    let doc = ctx.read_xml("doc", input).unwrap();
    let binding = ctx.class_binding("doc").unwrap();
    assert_eq!(
        binding.get(&doc, "line").unwrap(),
        Some(&MemberValue::List(strings(&["1", "2", "1"])))
    );
    assert_eq!(ctx.write_xml(&doc).unwrap(), input);
}

#[test]
fn indented_output_reads_back() {
    let mut options = BindingOptions::default();
    options.write.indent = Some(2);
    options.write.xml_declaration = true;
    let mut ctx = catalog_context();
    *ctx.options_mut() = options;
    let catalog = ctx.read_xml("catalog", CATALOG_XML).unwrap();
    let text = ctx.write_xml(&catalog).unwrap();
    assert!(text.starts_with("<?xml"));
    assert!(text.contains("\n  <title>"));
    assert_eq!(ctx.read_xml("catalog", &text).unwrap(), catalog);
}

#[test]
fn namespaced_flag_keeps_its_namespace() {
    let ctx = BindingContext::new().with_class(
        ClassDefinition::assembly("doc")
            .root("doc")
            .with_flag(PropertyDefinition::flag("id").namespace("urn:x")),
    );
    let doc = ctx
        .read_xml("doc", r#"<doc xmlns:x="urn:x" x:id="a"/>"#)
        .unwrap();
    let binding = ctx.class_binding("doc").unwrap();
    assert_eq!(
        binding.get(&doc, "id").unwrap(),
        Some(&MemberValue::Single(BoundItem::string("a")))
    );

    let text = ctx.write_xml(&doc).unwrap();
    assert_eq!(text, r#"<doc xmlns:ns1="urn:x" ns1:id="a"></doc>"#);
    assert_eq!(ctx.read_xml("doc", &text).unwrap(), doc);

    // an unqualified attribute of the same local name is a different flag
    let plain = ctx.read_xml("doc", r#"<doc id="a"/>"#).unwrap();
    assert_eq!(binding.get(&plain, "id").unwrap(), None);
}

#[test]
fn map_key_fills_an_unset_key_flag() {
    let ctx = keyed_context();
    let entry_binding = ctx.class_binding("entry").unwrap();
    let mut entry = entry_binding.new_instance();
    entry_binding
        .set(
            &mut entry,
            "v",
            Some(MemberValue::Single(BoundItem::Scalar(ScalarValue::Integer(1)))),
        )
        .unwrap();

    let binding = ctx.class_binding("doc").unwrap();
    let mut doc = binding.new_instance();
    let items = IndexMap::from([("k".to_string(), BoundItem::Object(entry))]);
    binding
        .set(&mut doc, "item", Some(MemberValue::Map(items)))
        .unwrap();

    let text = ctx.write_xml(&doc).unwrap();
    assert_eq!(text, r#"<doc><item key="k"><v>1</v></item></doc>"#);

    let back = ctx.read_xml("doc", &text).unwrap();
    let Some(MemberValue::Map(items)) = binding.get(&back, "item").unwrap() else {
        panic!("items should be a map");
    };
    assert_eq!(items.keys().collect::<Vec<_>>(), ["k"]);
    let k = items["k"].as_object().unwrap();
    assert_eq!(
        entry_binding.get(k, "key").unwrap(),
        Some(&MemberValue::Single(BoundItem::string("k")))
    );
    assert_eq!(
        entry_binding.get(k, "v").unwrap(),
        Some(&MemberValue::Single(BoundItem::Scalar(ScalarValue::Integer(1))))
    );
}

#[test]
fn duplicate_markup_keys_keep_the_last_item() {
    let ctx = keyed_context();
    let doc = ctx
        .read_xml(
            "doc",
            r#"<doc><item key="k"><v>1</v></item><item key="k"><v>2</v></item></doc>"#,
        )
        .unwrap();
    let binding = ctx.class_binding("doc").unwrap();
    let Some(MemberValue::Map(items)) = binding.get(&doc, "item").unwrap() else {
        panic!("items should be a map");
    };
    assert_eq!(items.len(), 1);
    let entry = ctx.class_binding("entry").unwrap();
    assert_eq!(
        entry.get(items["k"].as_object().unwrap(), "v").unwrap(),
        Some(&MemberValue::Single(BoundItem::Scalar(ScalarValue::Integer(2))))
    );
}
