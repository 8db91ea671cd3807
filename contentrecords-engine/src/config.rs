//! Component configuration.
//!
//! A component instance is a map carrying `@type`, `plugin` and a `data`
//! map with the settings below. Decoding is lenient about scalar shapes the
//! way host documents tend to be written: flags accept `true`, `"yes"`, `1`;
//! string settings accept numbers; `ids` accepts a single scalar.

use std::collections::BTreeMap;

use contentrecords_tree::Node;
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};

const DEFAULT_INLINE_PARAM: &str = "edit";
const DEFAULT_RECORD_PARAM: &str = "id";

/// A decoded component instance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComponentInstance {
    #[serde(rename = "@type", deserialize_with = "text")]
    pub node_type: String,
    #[serde(deserialize_with = "text")]
    pub plugin: String,
    pub data: RecordsConfig,
    /// Host document path of the instance, echoed in decode errors.
    #[serde(deserialize_with = "text")]
    pub hyperbricks_path: String,
    #[serde(deserialize_with = "text")]
    pub hyperbricks_key: String,
}

impl ComponentInstance {
    /// Decodes a component instance node.
    pub fn decode(instance: &Node) -> EngineResult<Self> {
        serde_json::from_value(instance.to_json()).map_err(|e| {
            let meta = |key: &str| {
                instance
                    .as_map()
                    .and_then(|map| map.get(key))
                    .map(Node::to_field_value)
                    .unwrap_or_default()
            };
            EngineError::Decode {
                path: meta("hyperbricks_path"),
                key: meta("hyperbricks_key"),
                message: e.to_string(),
            }
        })
    }
}

/// Editor metadata for one persisted field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FieldDef {
    #[serde(rename = "type", deserialize_with = "text")]
    pub kind: String,
    #[serde(deserialize_with = "text")]
    pub bind: String,
    #[serde(deserialize_with = "text")]
    pub path: String,
    #[serde(deserialize_with = "text")]
    pub label: String,
    #[serde(deserialize_with = "number")]
    pub order: i64,
}

/// The `data` map of a component instance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    pub template: Option<Node>,
    /// Legacy alias of `template`.
    #[serde(rename = "type")]
    pub legacy_type: Option<Node>,
    #[serde(deserialize_with = "text")]
    pub view: String,
    #[serde(deserialize_with = "text")]
    pub action: String,
    /// Legacy single-word mode (`render`, `cms`, `edit`).
    #[serde(deserialize_with = "text")]
    pub mode: String,
    #[serde(deserialize_with = "text")]
    pub store: String,
    pub schema: BTreeMap<String, FieldDef>,
    /// Legacy alias of `schema`.
    #[serde(rename = "fields")]
    pub legacy_fields: BTreeMap<String, FieldDef>,
    #[serde(deserialize_with = "text")]
    pub query: String,
    #[serde(deserialize_with = "text")]
    pub sql: String,
    pub id: Option<Node>,
    #[serde(deserialize_with = "id_list")]
    pub ids: Vec<Node>,
    #[serde(deserialize_with = "flag")]
    pub teaser: bool,
    #[serde(deserialize_with = "flag")]
    pub inline: bool,
    #[serde(deserialize_with = "text")]
    pub inline_param: String,
    #[serde(deserialize_with = "optional_flag")]
    pub preview: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub seed: bool,
    #[serde(deserialize_with = "flag")]
    pub editable: bool,
    #[serde(deserialize_with = "text")]
    pub edit_route: String,
    #[serde(deserialize_with = "text")]
    pub list_route: String,
    /// Legacy alias of `edit_route`.
    #[serde(deserialize_with = "text")]
    pub route: String,
    #[serde(deserialize_with = "text")]
    pub record_param: String,
    #[serde(deserialize_with = "text")]
    pub upload_dir: String,
    /// Legacy alias of `upload_dir`.
    #[serde(deserialize_with = "text")]
    pub upload: String,
}

impl RecordsConfig {
    /// The template tree (`template`, else legacy `type`).
    pub fn template(&self) -> Option<&Node> {
        self.template.as_ref().or(self.legacy_type.as_ref())
    }

    /// Field definitions (`schema`, else legacy `fields`).
    pub fn schema(&self) -> &BTreeMap<String, FieldDef> {
        if self.schema.is_empty() {
            &self.legacy_fields
        } else {
            &self.schema
        }
    }

    pub fn store_path(&self) -> &str {
        self.store.trim()
    }

    pub fn query(&self) -> &str {
        first_set(&self.query, &self.sql)
    }

    pub fn edit_route(&self) -> &str {
        first_set(&self.edit_route, &self.route)
    }

    /// Redirect target after a successful form action.
    pub fn list_route(&self) -> &str {
        first_set(&self.list_route, self.edit_route())
    }

    pub fn record_param(&self) -> &str {
        first_set(&self.record_param, DEFAULT_RECORD_PARAM)
    }

    pub fn inline_param(&self) -> &str {
        first_set(&self.inline_param, DEFAULT_INLINE_PARAM)
    }

    pub fn show_preview(&self) -> bool {
        self.preview.unwrap_or(true)
    }

    pub fn upload_dir(&self) -> &str {
        first_set(&self.upload_dir, &self.upload)
    }

    /// Explicit ids from `id` and `ids`, in that order. Zero and unparsable
    /// values are dropped.
    pub fn record_ids(&self) -> Vec<i64> {
        self.id
            .iter()
            .chain(self.ids.iter())
            .map(parse_id_value)
            .filter(|id| *id != 0)
            .collect()
    }

    /// The configured id for single views: `id`, else the first of `ids`.
    pub fn configured_record_id(&self) -> i64 {
        let id = self.id.as_ref().map(parse_id_value).unwrap_or(0);
        if id != 0 {
            return id;
        }
        self.ids.first().map(parse_id_value).unwrap_or(0)
    }
}

fn first_set<'a>(primary: &'a str, fallback: &'a str) -> &'a str {
    let primary = primary.trim();
    if primary.is_empty() {
        fallback.trim()
    } else {
        primary
    }
}

/// Record type name of a template: its root `@name`, or empty for untyped.
pub fn record_type_name(template: &Node) -> String {
    template
        .as_map()
        .and_then(|map| map.get("@name"))
        .and_then(Node::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Interprets an id given as a number or numeric string. Returns 0 otherwise.
pub fn parse_id_value(value: &Node) -> i64 {
    match value {
        Node::Int(i) => *i,
        Node::Float(f) => *f as i64,
        Node::Str(s) => parse_record_id(s),
        _ => 0,
    }
}

/// Parses a request-supplied record id. Returns 0 when absent or invalid.
pub fn parse_record_id(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

// ── Lenient scalar decoding ──────────────────────────────────────

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Node::deserialize(deserializer)? {
        node if node.is_container() => Err(de::Error::custom("expected a string")),
        node => Ok(node.to_field_value()),
    }
}

fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Node::deserialize(deserializer)? {
        Node::Null => Ok(0),
        Node::Int(i) => Ok(i),
        Node::Float(f) => Ok(f as i64),
        Node::Str(s) if s.trim().is_empty() => Ok(0),
        Node::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected an integer, got {s:?}"))),
        _ => Err(de::Error::custom("expected an integer")),
    }
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(optional_flag(deserializer)?.unwrap_or(false))
}

fn optional_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    match Node::deserialize(deserializer)? {
        Node::Null => Ok(None),
        node if node.is_container() => Err(de::Error::custom("expected a boolean")),
        node => Ok(Some(node.is_affirmative())),
    }
}

fn id_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Node>, D::Error> {
    match Node::deserialize(deserializer)? {
        Node::Null => Ok(Vec::new()),
        Node::List(items) => Ok(items),
        Node::Map(_) => Err(de::Error::custom("expected a list of ids")),
        scalar => Ok(vec![scalar]),
    }
}
