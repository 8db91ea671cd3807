//! Shared test helpers for engine tests.

#![allow(dead_code)]

use contentrecords_engine::{ContentRecords, RenderContext, Rendered};
use contentrecords_store::{FieldValues, RecordStore};
use contentrecords_tree::{get_at_path, Node};
use serde_json::{json, Value};
use std::sync::Arc;

/// An article template with a teaser/list title, a body and an image.
pub fn article_template() -> Value {
    json!({
        "@type": "<TREE>",
        "@name": "article",
        "10": {
            "@type": "<TEXT>",
            "@bind": {"field": "title", "path": "value"},
            "@list": true,
            "@teaser": true,
            "value": "Default title"
        },
        "20": {
            "@type": "<TEXT>",
            "@bind": {"field": "body", "path": "value"},
            "value": "Default body"
        },
        "30": {
            "@type": "<IMAGE>",
            "@bind": {"field": "image", "path": "src"},
            "src": "placeholder.png"
        }
    })
}

/// Wraps `data` in a component instance. Missing `template` and `store`
/// default to the article template and the in-memory store.
pub fn instance(mut data: Value) -> Node {
    if data.get("template").is_none() {
        data["template"] = article_template();
    }
    if data.get("store").is_none() {
        data["store"] = json!(":memory:");
    }
    Node::from(json!({"@type": "<PLUGIN>", "plugin": "ContentRecordsPlugin", "data": data}))
}

pub fn values(pairs: &[(&str, &str)]) -> FieldValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn memory_store(engine: &ContentRecords) -> Arc<RecordStore> {
    engine.registry().open(":memory:").unwrap()
}

/// Creates an `article` record in the engine's in-memory store.
pub fn create(engine: &ContentRecords, pairs: &[(&str, &str)]) -> i64 {
    memory_store(engine).create("article", &values(pairs)).unwrap()
}

pub fn field(engine: &ContentRecords, id: i64, key: &str) -> Option<String> {
    memory_store(engine)
        .fetch_by_id(id, "article")
        .unwrap()
        .get(key)
        .map(str::to_string)
}

/// Renders and expects a tree with no errors.
pub fn render_tree(engine: &ContentRecords, data: Value, ctx: &RenderContext<'_>) -> Node {
    let output = engine.render(&instance(data), ctx);
    assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);
    match output.rendered {
        Rendered::Tree(tree) => tree,
        other => panic!("expected a tree, got {other:?}"),
    }
}

pub fn text<'a>(tree: &'a Node, path: &str) -> Option<&'a str> {
    get_at_path(tree, path).and_then(Node::as_str)
}
