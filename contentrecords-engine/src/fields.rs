//! CMS field definitions.
//!
//! Definitions come from the configured schema, or are synthesized from the
//! template's binds when there is none. A schema entry names its bind
//! directly, through the template path of the bind, or implicitly by its own
//! name; entries whose bind the template does not declare are dropped.

use std::collections::{BTreeMap, BTreeSet};

use contentrecords_tree::{BindIndex, Map, Node};

use crate::config::{FieldDef, RecordsConfig};

const DEFAULT_FIELD_TYPE: &str = "text";
const IMAGE_FIELD_TYPE: &str = "image";

/// A resolved editor field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmsField {
    pub name: String,
    pub label: String,
    pub kind: String,
    pub bind: String,
    pub path: String,
    pub order: i64,
}

impl CmsField {
    /// The bind key holding this field's value.
    pub fn key(&self) -> &str {
        if self.bind.is_empty() {
            &self.name
        } else {
            &self.bind
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind.trim().eq_ignore_ascii_case(IMAGE_FIELD_TYPE)
    }

    /// Editor-facing description of the field.
    pub fn to_node(&self) -> Node {
        field_node(&self.name, &self.label, &self.kind, self.key(), &self.path)
    }
}

pub(crate) fn field_node(name: &str, label: &str, kind: &str, bind: &str, path: &str) -> Node {
    let mut map = Map::new();
    map.insert("name".into(), name.into());
    map.insert("label".into(), label.into());
    map.insert("type".into(), kind.into());
    map.insert("bind".into(), bind.into());
    map.insert("path".into(), path.into());
    Node::Map(map)
}

/// Resolves the bind key a schema entry refers to.
///
/// Returns `None` when the key is not declared by the template.
pub fn resolve_bind(name: &str, def: &FieldDef, binds: &BindIndex) -> Option<String> {
    let mut bind = def.bind.trim();
    let path = def.path.trim();
    if bind.is_empty() && !path.is_empty() {
        bind = binds.field_for_path(path).unwrap_or_default();
    }
    if bind.is_empty() {
        bind = name;
    }
    binds.contains(bind).then(|| bind.to_string())
}

/// Builds the ordered field definitions for the editor.
///
/// With a schema, fields are sorted by `order` when any field sets one
/// (unordered fields last, ties by name), otherwise by name. Without a schema
/// every bind becomes a text field, sorted by bind key.
pub fn collect_cms_fields(config: &RecordsConfig, binds: &BindIndex) -> Vec<CmsField> {
    let schema = config.schema();
    if schema.is_empty() {
        return binds
            .iter()
            .map(|(field, path)| CmsField {
                name: field.to_string(),
                label: field.to_string(),
                kind: DEFAULT_FIELD_TYPE.to_string(),
                bind: field.to_string(),
                path: path.to_string(),
                order: 0,
            })
            .collect();
    }

    let mut out: Vec<CmsField> = schema
        .iter()
        .filter_map(|(name, def)| {
            let bind = resolve_bind(name, def, binds)?;
            let label = match def.label.trim() {
                "" => bind.clone(),
                label => label.to_string(),
            };
            Some(CmsField {
                name: name.clone(),
                label,
                kind: def.kind.trim().to_string(),
                bind,
                path: def.path.clone(),
                order: def.order,
            })
        })
        .collect();

    // schema iteration is already name-ordered
    if out.iter().any(|f| f.order != 0) {
        out.sort_by_key(|f| if f.order == 0 { i64::MAX } else { f.order });
    }
    out
}

/// Bind keys of `image` fields. Empty stored values never clear these.
pub fn collect_image_binds(config: &RecordsConfig, binds: &BindIndex) -> BTreeSet<String> {
    config
        .schema()
        .iter()
        .filter(|(_, def)| def.kind.trim().eq_ignore_ascii_case(IMAGE_FIELD_TYPE))
        .filter_map(|(name, def)| resolve_bind(name, def, binds))
        .collect()
}

/// Lowercased field type per bind key, defaulting to `text`.
pub fn bind_types(config: &RecordsConfig, binds: &BindIndex) -> BTreeMap<String, String> {
    config
        .schema()
        .iter()
        .filter_map(|(name, def)| {
            let bind = resolve_bind(name, def, binds)?;
            let kind = match def.kind.trim() {
                "" => DEFAULT_FIELD_TYPE.to_string(),
                kind => kind.to_ascii_lowercase(),
            };
            Some((bind, kind))
        })
        .collect()
}

/// Bind keys shown as columns in CMS list rows.
///
/// Without `@list` flags every field is a column. Otherwise flagged fields
/// keep their definition order and flagged binds with no definition are
/// appended in sorted order.
pub fn list_field_ids(fields: &[CmsField], list_binds: &BTreeSet<String>) -> Vec<String> {
    if list_binds.is_empty() {
        return fields.iter().map(|f| f.key().to_string()).collect();
    }
    let mut ids: Vec<String> = fields
        .iter()
        .map(CmsField::key)
        .filter(|key| list_binds.contains(*key))
        .map(str::to_string)
        .collect();
    let extra: Vec<String> = list_binds
        .iter()
        .filter(|key| !ids.contains(*key))
        .cloned()
        .collect();
    ids.extend(extra);
    ids
}
