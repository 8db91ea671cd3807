//! Dotted-path addressing over template trees.
//!
//! A path is a `.`-separated list of segments. A segment names a map key, or,
//! when the current node is a list, a base-10 index. Segments are trimmed and
//! empty segments are ignored, so `""` addresses the root.
//!
//! Lookups never fail loudly: a missing key, an out-of-range index or a
//! segment applied to a scalar simply yields "not found". Callers treat that
//! as a stale binding rather than an error.

use crate::node::Node;

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').map(str::trim).filter(|s| !s.is_empty())
}

fn child<'a>(node: &'a Node, segment: &str) -> Option<&'a Node> {
    match node {
        Node::Map(map) => map.get(segment),
        Node::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Node, segment: &str) -> Option<&'a mut Node> {
    match node {
        Node::Map(map) => map.get_mut(segment),
        Node::List(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

/// Returns the node at `path`, or `None` when the path does not resolve.
pub fn get_at_path<'a>(root: &'a Node, path: &str) -> Option<&'a Node> {
    segments(path).try_fold(root, child)
}

/// Mutable variant of [`get_at_path`].
pub fn get_at_path_mut<'a>(root: &'a mut Node, path: &str) -> Option<&'a mut Node> {
    let mut current = root;
    for segment in segments(path) {
        current = child_mut(current, segment)?;
    }
    Some(current)
}

/// Writes `value` at `path`. Returns false if the path does not resolve.
///
/// Every segment but the last must already exist. The last segment replaces
/// an existing list element, or inserts/replaces a key on a map.
pub fn set_at_path(root: &mut Node, path: &str, value: Node) -> bool {
    let parts: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = parts.split_last() else {
        return false;
    };

    let mut current = root;
    for segment in parents {
        match child_mut(current, segment) {
            Some(next) => current = next,
            None => return false,
        }
    }

    match current {
        Node::Map(map) => {
            map.insert((*last).to_string(), value);
            true
        }
        Node::List(items) => match last.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        },
        _ => false,
    }
}

/// Splits a path into its parent path and final segment.
///
/// ```
/// use contentrecords_tree::split_path;
/// assert_eq!(split_path("10.value"), ("10", "value"));
/// assert_eq!(split_path("value"), ("", "value"));
/// ```
#[must_use]
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('.') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Appends a segment to a base path.
#[must_use]
pub fn join_path(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{base}.{segment}")
    }
}
