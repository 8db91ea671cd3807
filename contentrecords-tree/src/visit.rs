//! Generic boundary-aware traversal.
//!
//! All tree walks in the engine (bind collection, flag collection, boundary
//! search, meta-key stripping) go through these two functions. The visitor
//! sees every map node together with its path and decides whether the walk
//! continues into that map's children. Keys starting with `@` are metadata
//! and are never descended into.

use crate::node::{Map, Node};
use crate::path::join_path;

/// Decision returned by a visitor for the map it was just shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Continue into the map's non-metadata children.
    Descend,
    /// Do not look at this map's children.
    Skip,
}

/// Returns true for metadata keys (`@type`, `@bind`, ...).
#[must_use]
pub fn is_meta_key(key: &str) -> bool {
    key.starts_with('@')
}

/// Walks `node`, calling `visitor` for every reachable map with its path.
pub fn walk<'a, F>(node: &'a Node, path: &str, visitor: &mut F)
where
    F: FnMut(&'a Map, &str) -> Visit,
{
    match node {
        Node::Map(map) => {
            if visitor(map, path) == Visit::Skip {
                return;
            }
            for (key, child) in map {
                if is_meta_key(key) {
                    continue;
                }
                walk(child, &join_path(path, key), visitor);
            }
        }
        Node::List(items) => {
            for (idx, child) in items.iter().enumerate() {
                walk(child, &join_path(path, &idx.to_string()), visitor);
            }
        }
        _ => {}
    }
}

/// Mutable walk. The visitor may edit each map before its children are visited.
pub fn walk_mut<F>(node: &mut Node, visitor: &mut F)
where
    F: FnMut(&mut Map) -> Visit,
{
    match node {
        Node::Map(map) => {
            if visitor(map) == Visit::Skip {
                return;
            }
            for (key, child) in map.iter_mut() {
                if is_meta_key(key) {
                    continue;
                }
                walk_mut(child, visitor);
            }
        }
        Node::List(items) => {
            for child in items.iter_mut() {
                walk_mut(child, visitor);
            }
        }
        _ => {}
    }
}
