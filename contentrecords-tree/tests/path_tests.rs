use contentrecords_tree::{get_at_path, join_path, set_at_path, split_path, Node};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn sample() -> Node {
    Node::from(json!({
        "10": {
            "@type": "<TEXT>",
            "value": "Title"
        },
        "items": [
            {"value": "first"},
            {"value": "second"}
        ],
        "count": 3
    }))
}

// ── get_at_path ──────────────────────────────────────────────────

#[test]
fn get_map_key() {
    let root = sample();
    assert_eq!(get_at_path(&root, "10.value"), Some(&Node::from("Title")));
}

#[test]
fn get_list_index() {
    let root = sample();
    assert_eq!(get_at_path(&root, "items.1.value"), Some(&Node::from("second")));
}

#[test]
fn get_empty_path_is_root() {
    let root = sample();
    assert_eq!(get_at_path(&root, ""), Some(&root));
}

#[test]
fn get_ignores_empty_and_padded_segments() {
    let root = sample();
    assert_eq!(get_at_path(&root, " 10 ..value"), Some(&Node::from("Title")));
}

#[test]
fn get_missing_key_not_found() {
    assert_eq!(get_at_path(&sample(), "20.value"), None);
}

#[test]
fn get_out_of_range_not_found() {
    assert_eq!(get_at_path(&sample(), "items.5"), None);
}

#[test]
fn get_non_numeric_index_not_found() {
    assert_eq!(get_at_path(&sample(), "items.first"), None);
}

#[test]
fn get_through_scalar_not_found() {
    assert_eq!(get_at_path(&sample(), "count.value"), None);
}

// ── set_at_path ──────────────────────────────────────────────────

#[test]
fn set_existing_key() {
    let mut root = sample();
    assert!(set_at_path(&mut root, "10.value", Node::from("New")));
    assert_eq!(get_at_path(&root, "10.value"), Some(&Node::from("New")));
}

#[test]
fn set_new_final_key_on_map() {
    let mut root = sample();
    assert!(set_at_path(&mut root, "10.enclose", Node::from("<b>|</b>")));
    assert_eq!(get_at_path(&root, "10.enclose"), Some(&Node::from("<b>|</b>")));
}

#[test]
fn set_list_element() {
    let mut root = sample();
    assert!(set_at_path(&mut root, "items.0", Node::from("replaced")));
    assert_eq!(get_at_path(&root, "items.0"), Some(&Node::from("replaced")));
}

#[test]
fn set_missing_intermediate_fails_without_change() {
    let mut root = sample();
    let before = root.clone();
    assert!(!set_at_path(&mut root, "missing.value", Node::from("x")));
    assert_eq!(root, before);
}

#[test]
fn set_out_of_range_index_fails() {
    let mut root = sample();
    assert!(!set_at_path(&mut root, "items.9", Node::from("x")));
}

#[test]
fn set_on_scalar_fails() {
    let mut root = sample();
    assert!(!set_at_path(&mut root, "count.value", Node::from("x")));
}

#[test]
fn set_empty_path_fails() {
    let mut root = sample();
    assert!(!set_at_path(&mut root, " . ", Node::from("x")));
}

// ── helpers ──────────────────────────────────────────────────────

#[test]
fn split_and_join() {
    assert_eq!(split_path("a.b.c"), ("a.b", "c"));
    assert_eq!(split_path("c"), ("", "c"));
    assert_eq!(join_path("", "a"), "a");
    assert_eq!(join_path("a", "b"), "a.b");
}

// ── Properties ───────────────────────────────────────────────────

fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,6}").unwrap()
}

fn nested(keys: &[String], leaf: Node) -> Node {
    keys.iter().rev().fold(leaf, |acc, key| {
        let mut map = contentrecords_tree::Map::new();
        map.insert(key.clone(), acc);
        Node::Map(map)
    })
}

proptest! {
    #[test]
    fn set_then_get_returns_value(
        keys in prop::collection::vec(key_strategy(), 1..6),
        value in "[ -~]{0,20}",
    ) {
        let mut root = nested(&keys, Node::from("seed"));
        let path = keys.join(".");
        let expected = Node::from(value);
        prop_assert!(set_at_path(&mut root, &path, expected.clone()));
        prop_assert_eq!(get_at_path(&root, &path), Some(&expected));
    }

    #[test]
    fn clone_is_independent(keys in prop::collection::vec(key_strategy(), 1..6)) {
        let original = nested(&keys, Node::from("seed"));
        let mut copy = original.clone();
        let path = keys.join(".");
        set_at_path(&mut copy, &path, Node::from("changed"));
        let seed = Node::from("seed");
        prop_assert_eq!(get_at_path(&original, &path), Some(&seed));
    }
}
