use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TreeResult;

/// Canonical string-keyed mapping used for every map node.
pub type Map = BTreeMap<String, Node>;

/// A node of a template tree.
///
/// Every document, whatever its source representation, is normalized into
/// this one type at ingestion. Traversals never see foreign map types.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Node>),
    Map(Map),
}

impl Node {
    /// Creates an empty map node.
    #[must_use]
    pub fn map() -> Self {
        Node::Map(Map::new())
    }

    /// Parses a JSON document into a canonical node.
    pub fn parse_json(input: &str) -> TreeResult<Self> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        Ok(Node::from(value))
    }

    /// Parses a YAML document into a canonical node.
    ///
    /// Non-string mapping keys (numbers, booleans) are stringified.
    pub fn parse_yaml(input: &str) -> TreeResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(input)?;
        Ok(Node::from(value))
    }

    /// Converts the node into a `serde_json::Value`.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Node::Null => serde_json::Value::Null,
            Node::Bool(b) => serde_json::Value::Bool(*b),
            Node::Int(i) => serde_json::Value::from(*i),
            Node::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Node::Str(s) => serde_json::Value::String(s.clone()),
            Node::List(items) => serde_json::Value::Array(items.iter().map(Node::to_json).collect()),
            Node::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Node>> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for maps and lists.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Node::Map(_) | Node::List(_))
    }

    /// Flag truthiness used by `@list` / `@teaser` style markers.
    ///
    /// Strings are truthy unless empty, `"false"` or `"0"`.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Node::Bool(b) => *b,
            Node::Int(i) => *i != 0,
            Node::Float(f) => *f != 0.0,
            Node::Str(s) => {
                let v = s.trim().to_ascii_lowercase();
                !v.is_empty() && v != "false" && v != "0"
            }
            _ => false,
        }
    }

    /// Stricter truthiness for configuration switches: strings must spell
    /// out an affirmative (`1`, `true`, `yes`, `on`, `y`).
    #[must_use]
    pub fn is_affirmative(&self) -> bool {
        match self {
            Node::Bool(b) => *b,
            Node::Int(i) => *i != 0,
            Node::Float(f) => *f != 0.0,
            Node::Str(s) => is_affirmative_str(s),
            _ => false,
        }
    }

    /// Renders the node as a stored field value.
    ///
    /// Scalars are written plainly, containers as compact JSON and `Null`
    /// as the empty string.
    #[must_use]
    pub fn to_field_value(&self) -> String {
        match self {
            Node::Null => String::new(),
            Node::Bool(b) => b.to_string(),
            Node::Int(i) => i.to_string(),
            Node::Float(f) => f.to_string(),
            Node::Str(s) => s.clone(),
            Node::List(_) | Node::Map(_) => self.to_json().to_string(),
        }
    }
}

/// Parses an affirmative switch value such as a query parameter.
#[must_use]
pub fn is_affirmative_str(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "y"
    )
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Node::Null,
            serde_json::Value::Bool(b) => Node::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Int(i),
                None => Node::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Node::Str(s),
            serde_json::Value::Array(items) => Node::List(items.into_iter().map(Node::from).collect()),
            serde_json::Value::Object(obj) => {
                Node::Map(obj.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl From<serde_yaml::Value> for Node {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Node::Null,
            serde_yaml::Value::Bool(b) => Node::Bool(b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Int(i),
                None => Node::Float(n.as_f64().unwrap_or_default()),
            },
            serde_yaml::Value::String(s) => Node::Str(s),
            serde_yaml::Value::Sequence(items) => {
                Node::List(items.into_iter().map(Node::from).collect())
            }
            serde_yaml::Value::Mapping(mapping) => Node::Map(
                mapping
                    .into_iter()
                    .map(|(k, v)| (yaml_key(k), Node::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Node::from(tagged.value),
        }
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => Node::from(other).to_field_value(),
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Str(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Str(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Int(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Bool(value)
    }
}

impl From<Map> for Node {
    fn from(value: Map) -> Self {
        Node::Map(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Node::List(value)
    }
}
