//! Bind extraction and flag handling.
//!
//! A bind is declared on a map node as
//! `@bind: { field: "title", path: "value" }`; the path is relative to the
//! node carrying the declaration. [`collect_binds`] resolves every declaration
//! into an absolute path from the template root.
//!
//! Nested instances of the engine (and subtrees explicitly flagged as a
//! boundary) own their own binds. No walk in this module crosses into them.

use std::collections::{BTreeMap, BTreeSet};

use crate::node::{Map, Node};
use crate::path::join_path;
use crate::visit::{is_meta_key, walk, walk_mut, Visit};

/// Host node kind used for plugin instances.
pub const PLUGIN_NODE_TYPE: &str = "<PLUGIN>";

/// Plugin name fragment that identifies another instance of this engine.
pub const ENGINE_PLUGIN_NAME: &str = "contentrecords";

/// Flag selecting the columns shown in CMS list rows.
pub const LIST_FLAG: &str = "@list";

/// Flag selecting the reduced teaser template.
pub const TEASER_FLAG: &str = "@teaser";

/// Metadata keys removed from materialized instances.
pub const META_KEYS: [&str; 4] = ["@bind", "@name", "@list", "@teaser"];

/// Returns true when `map` is a nested engine instance or an explicit boundary.
#[must_use]
pub fn is_boundary(map: &Map) -> bool {
    let is_plugin = map
        .get("@type")
        .and_then(Node::as_str)
        .is_some_and(|t| t.trim().eq_ignore_ascii_case(PLUGIN_NODE_TYPE));
    if !is_plugin {
        return false;
    }

    let plugin_name = map.get("plugin").and_then(Node::as_str).unwrap_or_default();
    if plugin_name.to_ascii_lowercase().contains(ENGINE_PLUGIN_NAME) {
        return true;
    }

    match map.get("data").and_then(Node::as_map) {
        Some(data) => ["content_record_boundary", "boundary"]
            .iter()
            .any(|key| data.get(*key).is_some_and(Node::is_affirmative)),
        None => false,
    }
}

/// Returns true if any map in the tree (the root included) is a boundary.
#[must_use]
pub fn contains_boundary(node: &Node) -> bool {
    let mut found = false;
    walk(node, "", &mut |map, _| {
        if found || is_boundary(map) {
            found = true;
            return Visit::Skip;
        }
        Visit::Descend
    });
    found
}

/// Returns true if `map` carries a truthy `flag_key`.
#[must_use]
pub fn has_flag(map: &Map, flag_key: &str) -> bool {
    map.get(flag_key).is_some_and(Node::is_truthy)
}

fn bind_field(map: &Map) -> Option<&str> {
    let field = map.get("@bind")?.as_map()?.get("field")?.as_str()?.trim();
    (!field.is_empty()).then_some(field)
}

fn bind_declaration(map: &Map) -> Option<(&str, &str)> {
    let bind = map.get("@bind")?.as_map()?;
    let field = bind.get("field")?.as_str()?.trim();
    let path = bind.get("path")?.as_str()?.trim();
    (!field.is_empty() && !path.is_empty()).then_some((field, path))
}

/// Mapping from bind field name to absolute template path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindIndex {
    targets: BTreeMap<String, String>,
}

impl BindIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a binding unless the field is already bound.
    pub fn insert_first(&mut self, field: impl Into<String>, path: impl Into<String>) {
        self.targets.entry(field.into()).or_insert_with(|| path.into());
    }

    /// Returns the bound path for a field.
    pub fn path(&self, field: &str) -> Option<&str> {
        self.targets.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.targets.contains_key(field)
    }

    /// Returns the field bound to exactly `path`, if any.
    pub fn field_for_path(&self, path: &str) -> Option<&str> {
        self.targets
            .iter()
            .find(|(_, p)| p.as_str() == path)
            .map(|(field, _)| field.as_str())
    }

    /// Iterates `(field, path)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.targets.iter().map(|(f, p)| (f.as_str(), p.as_str()))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Collects every bind reachable from `node` without crossing a boundary.
///
/// A boundary node's own `@bind` is still registered; only its children are
/// hidden.
#[must_use]
pub fn collect_binds(node: &Node, base_path: &str) -> BindIndex {
    let mut index = BindIndex::new();
    walk(node, base_path, &mut |map, path| {
        if let Some((field, bind_path)) = bind_declaration(map) {
            index.insert_first(field, join_path(path, bind_path));
        }
        if is_boundary(map) {
            Visit::Skip
        } else {
            Visit::Descend
        }
    });
    index
}

/// Collects the bind field names of all nodes carrying a truthy `flag_key`.
#[must_use]
pub fn collect_flagged_keys(node: &Node, flag_key: &str) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    walk(node, "", &mut |map, _| {
        if has_flag(map, flag_key) {
            if let Some(field) = bind_field(map) {
                keys.insert(field.to_string());
            }
        }
        if is_boundary(map) {
            Visit::Skip
        } else {
            Visit::Descend
        }
    });
    keys
}

/// Reduces a tree to the subtrees carrying `flag_key`.
///
/// Flagged maps are kept whole. Their ancestors are kept with all `@` keys
/// and non-container siblings; container siblings without a match are
/// pruned. Returns `None` when nothing in the tree carries the flag, in which
/// case callers fall back to the unfiltered tree.
#[must_use]
pub fn filter_by_flag(node: &Node, flag_key: &str) -> Option<Node> {
    match node {
        Node::Map(map) => {
            if has_flag(map, flag_key) {
                return Some(node.clone());
            }
            if is_boundary(map) {
                return None;
            }

            let mut out = Map::new();
            let mut kept = false;
            for (key, child) in map {
                if is_meta_key(key) {
                    out.insert(key.clone(), child.clone());
                } else if let Some(filtered) = filter_by_flag(child, flag_key) {
                    out.insert(key.clone(), filtered);
                    kept = true;
                }
            }
            if !kept {
                return None;
            }
            for (key, child) in map {
                if !child.is_container() && !out.contains_key(key) {
                    out.insert(key.clone(), child.clone());
                }
            }
            Some(Node::Map(out))
        }
        Node::List(items) => {
            let out: Vec<Node> = items
                .iter()
                .filter_map(|child| filter_by_flag(child, flag_key))
                .collect();
            (!out.is_empty()).then_some(Node::List(out))
        }
        _ => None,
    }
}

/// Removes bind and flag metadata from every map outside boundary subtrees.
pub fn strip_meta_keys(node: &mut Node) {
    walk_mut(node, &mut |map| {
        if is_boundary(map) {
            return Visit::Skip;
        }
        for key in META_KEYS {
            map.remove(key);
        }
        Visit::Descend
    });
}
