//! Editor view data.
//!
//! CMS modes do not render records themselves. They hand the host a
//! `<TEMPLATE>` node: fixed editor markup plus a flat `values` map the markup
//! reads from.

use std::collections::BTreeSet;

use contentrecords_store::Record;
use contentrecords_tree::{Map, Node};

use crate::config::RecordsConfig;
use crate::fields::{field_node, list_field_ids, CmsField};
use crate::materialize::TREE_NODE_TYPE;
use crate::mode::Mode;

/// Markup of the record list editor.
pub const LIST_EDITOR_MARKUP: &str = include_str!("editor/list.html");

/// Markup of the single record form.
pub const SINGLE_EDITOR_MARKUP: &str = include_str!("editor/single.html");

const TEMPLATE_NODE_TYPE: &str = "<TEMPLATE>";

/// Wraps editor markup and its values as `{<TREE>, 10: <TEMPLATE>}`.
pub fn editor_tree(markup: &str, values: Node) -> Node {
    let mut editor = Map::new();
    editor.insert("@type".into(), TEMPLATE_NODE_TYPE.into());
    editor.insert("inline".into(), markup.into());
    editor.insert("values".into(), values);

    let mut tree = Map::new();
    tree.insert("@type".into(), TREE_NODE_TYPE.into());
    tree.insert("10".into(), Node::Map(editor));
    Node::Map(tree)
}

fn record_node(record: &Record) -> Node {
    let fields: Map = record
        .fields
        .iter()
        .map(|(k, v)| (k.clone(), Node::from(v.as_str())))
        .collect();
    let mut map = Map::new();
    map.insert("id".into(), Node::from(record.id.to_string()));
    map.insert("fields".into(), Node::Map(fields));
    Node::Map(map)
}

fn string_list<I: IntoIterator<Item = String>>(items: I) -> Node {
    Node::List(items.into_iter().map(Node::from).collect())
}

/// Field definitions keyed by bind key, plus the ordered keys.
fn field_maps(fields: &[CmsField]) -> (Map, Vec<String>) {
    let defs = fields
        .iter()
        .map(|f| (f.key().to_string(), f.to_node()))
        .collect();
    let ids = fields.iter().map(|f| f.key().to_string()).collect();
    (defs, ids)
}

/// Values for the list editor.
pub struct ListEditorData<'a> {
    pub config: &'a RecordsConfig,
    pub mode: Mode,
    pub record_type: &'a str,
    pub records: &'a [Record],
    pub fields: &'a [CmsField],
    /// Bind keys flagged `@list` in the template.
    pub list_binds: &'a BTreeSet<String>,
    pub preview: Option<Node>,
}

impl ListEditorData<'_> {
    pub fn into_values(self) -> Node {
        let record_ids = self.records.iter().map(|r| r.id.to_string());
        let records: Map = self
            .records
            .iter()
            .map(|r| (r.id.to_string(), record_node(r)))
            .collect();

        let (mut defs, field_ids) = field_maps(self.fields);
        let list_ids = list_field_ids(self.fields, self.list_binds);
        for id in &list_ids {
            defs.entry(id.clone())
                .or_insert_with(|| field_node(id, id, "text", id, ""));
        }

        let config = self.config;
        let mut values = Map::new();
        values.insert("type".into(), self.record_type.into());
        values.insert("view".into(), self.mode.view.as_str().into());
        values.insert("action".into(), self.mode.action.as_str().into());
        values.insert("store".into(), config.store.as_str().into());
        values.insert("query".into(), config.query().into());
        values.insert("edit_route".into(), config.edit_route().into());
        values.insert("record_param".into(), config.record_param().into());
        values.insert("records".into(), Node::Map(records));
        values.insert("record_ids".into(), string_list(record_ids));
        values.insert("fields".into(), Node::Map(defs));
        values.insert("field_ids".into(), string_list(field_ids));
        values.insert("list_field_ids".into(), string_list(list_ids));
        values.insert("show_preview".into(), config.show_preview().into());
        values.insert("preview".into(), self.preview.unwrap_or_default());
        Node::Map(values)
    }
}

/// Values for the single record form.
pub struct SingleEditorData<'a> {
    pub config: &'a RecordsConfig,
    pub mode: Mode,
    pub record_type: &'a str,
    pub record: &'a Record,
    pub fields: &'a [CmsField],
    pub preview: Option<Node>,
}

impl SingleEditorData<'_> {
    pub fn into_values(self) -> Node {
        let (defs, field_ids) = field_maps(self.fields);
        let config = self.config;

        let mut values = Map::new();
        values.insert("type".into(), self.record_type.into());
        values.insert("view".into(), self.mode.view.as_str().into());
        values.insert("action".into(), self.mode.action.as_str().into());
        values.insert("store".into(), config.store.as_str().into());
        values.insert("record_id".into(), Node::from(self.record.id.to_string()));
        values.insert("show_preview".into(), config.show_preview().into());
        values.insert("record".into(), record_node(self.record));
        values.insert("fields".into(), Node::Map(defs));
        values.insert("field_ids".into(), string_list(field_ids));
        values.insert("preview".into(), self.preview.unwrap_or_default());
        Node::Map(values)
    }
}
