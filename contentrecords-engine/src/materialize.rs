//! Template materialization.
//!
//! Turns a template plus stored records into render-ready trees: bind
//! metadata is stripped, stored values are written at their bound paths and,
//! depending on the mode, edit links and inline-editor wrappers are added.

use std::collections::{BTreeMap, BTreeSet};

use contentrecords_store::Record;
use contentrecords_tree::{
    filter_by_flag, get_at_path, get_at_path_mut, set_at_path, split_path, strip_meta_keys,
    BindIndex, Map, Node, TEASER_FLAG,
};

/// Host node type for a container of children.
pub const TREE_NODE_TYPE: &str = "<TREE>";

/// Key of the synthesized edit-link node.
pub const EDIT_LINK_KEY: &str = "_edit";

const LIST_KEY_STEP: usize = 10;

/// Inline-editing settings for one render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineOptions {
    bind_types: BTreeMap<String, String>,
}

impl InlineOptions {
    pub fn new(bind_types: BTreeMap<String, String>) -> Self {
        Self { bind_types }
    }

    /// Editor type of a bind (`text` unless the schema says otherwise).
    pub fn bind_type(&self, bind: &str) -> String {
        match self.bind_types.get(bind).map(|t| t.trim()) {
            Some(t) if !t.is_empty() => t.to_ascii_lowercase(),
            _ => "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct EditLink<'a> {
    route: &'a str,
    record_param: &'a str,
}

/// Builds record instances from one template.
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'a> {
    binds: &'a BindIndex,
    image_binds: &'a BTreeSet<String>,
    edit_link: Option<EditLink<'a>>,
    inline: Option<&'a InlineOptions>,
}

impl<'a> Materializer<'a> {
    pub fn new(binds: &'a BindIndex, image_binds: &'a BTreeSet<String>) -> Self {
        Self {
            binds,
            image_binds,
            edit_link: None,
            inline: None,
        }
    }

    /// Adds an edit link to every instance. A blank route disables it.
    pub fn with_edit_link(mut self, route: &'a str, record_param: &'a str) -> Self {
        let route = route.trim();
        self.edit_link = (!route.is_empty()).then_some(EditLink {
            route,
            record_param,
        });
        self
    }

    pub fn with_inline(mut self, inline: Option<&'a InlineOptions>) -> Self {
        self.inline = inline;
        self
    }

    /// Materializes one record.
    pub fn build_instance(&self, template: &Node, record: &Record) -> Node {
        let mut instance = template.clone();
        strip_meta_keys(&mut instance);

        for (bind, value) in &record.fields {
            let Some(path) = self.binds.path(bind) else {
                continue;
            };
            if value.is_empty() && self.image_binds.contains(bind) {
                continue;
            }
            set_at_path(&mut instance, path, Node::from(value.as_str()));
        }

        if let Some(link) = self.edit_link {
            add_edit_link(&mut instance, link.route, link.record_param, record.id);
        }
        if let Some(inline) = self.inline {
            apply_inline_attributes(&mut instance, self.binds, record, inline);
        }
        instance
    }

    /// Materializes every record under keys `10`, `20`, ... of a `<TREE>`.
    pub fn build_list(&self, template: &Node, records: &[Record]) -> Node {
        let mut list = Map::new();
        list.insert("@type".into(), TREE_NODE_TYPE.into());
        for (idx, record) in records.iter().enumerate() {
            let key = ((idx + 1) * LIST_KEY_STEP).to_string();
            list.insert(key, self.build_instance(template, record));
        }
        Node::Map(list)
    }
}

/// Returns the teaser view of a template when `teaser` is set.
///
/// Templates without any `@teaser` flag are returned unchanged.
pub fn apply_teaser(template: &Node, teaser: bool) -> Node {
    if !teaser {
        return template.clone();
    }
    filter_by_flag(template, TEASER_FLAG).unwrap_or_else(|| template.clone())
}

/// Adds an `_edit` HTML node linking to `route` with the record id appended.
///
/// Does nothing if the instance already has an edit link.
pub fn add_edit_link(instance: &mut Node, route: &str, record_param: &str, id: i64) {
    let route = route.trim();
    let Some(map) = instance.as_map_mut() else {
        return;
    };
    if route.is_empty() || map.contains_key(EDIT_LINK_KEY) {
        return;
    }
    let param = match record_param.trim() {
        "" => "id",
        param => param,
    };
    let separator = if route.contains('?') { '&' } else { '?' };
    let href = format!("{route}{separator}{param}={id}");

    let mut link = Map::new();
    link.insert("@type".into(), "<HTML>".into());
    link.insert(
        "value".into(),
        Node::from(format!(
            r#"<a class="content-records-edit-link" href="{}">Edit</a>"#,
            escape_html(&href)
        )),
    );
    map.insert(EDIT_LINK_KEY.into(), Node::Map(link));
}

/// Wraps the node rendering each bind with inline-editor attributes.
///
/// The wrapped node is the nearest typed ancestor of the bound value.
/// Container (`<TREE>`) nodes are never wrapped.
pub fn apply_inline_attributes(
    instance: &mut Node,
    binds: &BindIndex,
    record: &Record,
    inline: &InlineOptions,
) {
    for (bind, path) in binds.iter() {
        let (node_path, _) = split_path(path);
        let Some(target) = inline_target(instance, node_path) else {
            continue;
        };
        let Some(node) = get_at_path_mut(instance, &target).and_then(Node::as_map_mut) else {
            continue;
        };
        if node.get("@type").and_then(Node::as_str) == Some(TREE_NODE_TYPE) {
            continue;
        }
        let value = record.get(bind).unwrap_or_default();
        wrap_inline(node, bind, record.id, &inline.bind_type(bind), value);
    }
}

fn map_at<'n>(root: &'n Node, path: &str) -> Option<&'n Map> {
    get_at_path(root, path).and_then(Node::as_map)
}

fn inline_target(instance: &Node, node_path: &str) -> Option<String> {
    let mut current = node_path.trim();
    loop {
        let typed = map_at(instance, current)
            .and_then(|map| map.get("@type"))
            .and_then(Node::as_str)
            .is_some_and(|t| !t.trim().is_empty());
        if typed {
            return Some(current.to_string());
        }
        if current.is_empty() {
            break;
        }
        current = split_path(current).0;
    }
    map_at(instance, node_path).map(|_| node_path.to_string())
}

fn wrap_inline(node: &mut Map, bind: &str, id: i64, kind: &str, value: &str) {
    let attrs = format!(
        r#"data-cr-bind="{}" data-cr-id="{id}" data-cr-type="{}" data-cr-value="{}""#,
        escape_html(bind),
        escape_html(kind),
        escape_html(value),
    );

    let existing = node.get("enclose").and_then(Node::as_str).unwrap_or_default();
    let enclose = if existing.trim().is_empty() {
        format!(r#"<div class="cr-inline cr-inline--block" {attrs}>|</div>"#)
    } else if existing.contains("data-cr-bind=") || existing.contains("cr-inline") {
        return;
    } else {
        existing.replacen('|', &format!(r#"<span class="cr-inline" {attrs}>|</span>"#), 1)
    };
    node.insert("enclose".into(), Node::from(enclose));
}

/// Escapes text for use inside HTML attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
