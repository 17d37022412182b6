//! Writer output fed back through the matching reader.

use metabind_io::markup::{MarkupEvent, MarkupReader, MarkupWriter};
use metabind_io::{JsonReader, JsonToken, JsonWriter, QName};
use serde_json::json;

#[test]
fn markup_writer_output_reads_back_with_namespaces() {
    let ns = Some("http://example.com/ns");
    let root = QName::new(ns, "catalog");
    let item = QName::new(ns, "item");

    let mut w = MarkupWriter::new(Some(2));
    w.declaration().unwrap();
    w.start_element(&root, &[(QName::local("id"), "c-1".into())]).unwrap();
    for text in ["a", "b & c"] {
        w.start_element(&item, &[]).unwrap();
        w.text(text).unwrap();
        w.end_element().unwrap();
    }
    w.end_element().unwrap();
    let doc = w.finish().unwrap();

    let mut r = MarkupReader::new(&doc);
    let start = r.consume_start(&root).unwrap();
    assert_eq!(start.attribute(&QName::local("id")), Some("c-1"));
    let mut texts = Vec::new();
    while r.is_start_of(&item).unwrap() {
        r.consume_start(&item).unwrap();
        texts.push(r.read_text().unwrap());
        r.consume_end(&item).unwrap();
    }
    r.consume_end(&root).unwrap();
    assert!(r.is_eof().unwrap());
    assert_eq!(texts, vec!["a", "b & c"]);
}

#[test]
fn markup_reader_rejects_undeclared_prefix() {
    let mut r = MarkupReader::new("<a><p:b/></a>");
    r.consume_start(&QName::local("a")).unwrap();
    match r.peek() {
        Err(metabind_io::MarkupError::UnboundPrefix { prefix, .. }) => assert_eq!(prefix, "p"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn markup_peek_does_not_skip_significant_text() {
    let mut r = MarkupReader::new("<a>42</a>");
    r.consume_start(&QName::local("a")).unwrap();
    assert_eq!(r.peek().unwrap(), Some(&MarkupEvent::Text("42".into())));
    assert!(r.peek_start().unwrap().is_none());
    assert_eq!(r.read_text().unwrap(), "42");
}

#[test]
fn json_writer_output_reads_back() {
    let mut w = JsonWriter::new(Some(2));
    w.start_object().unwrap();
    w.field_name("x").unwrap();
    w.start_object().unwrap();
    w.field_name("v").unwrap();
    w.scalar(&json!(1)).unwrap();
    w.end_object().unwrap();
    w.field_name("list").unwrap();
    w.start_array().unwrap();
    w.scalar(&json!("a")).unwrap();
    w.scalar(&json!(null)).unwrap();
    w.end_array().unwrap();
    w.end_object().unwrap();
    let doc = w.finish().unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();
    assert_eq!(parsed, json!({"x": {"v": 1}, "list": ["a", null]}));

    let mut r = JsonReader::new(&doc);
    let mut names = Vec::new();
    while let Some(token) = r.next_token().unwrap() {
        if let JsonToken::FieldName(name) = token {
            names.push(name);
        }
    }
    assert_eq!(names, vec!["x", "v", "list"]);
}
