use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field values keyed by bind key.
///
/// Values are always strings. Interpreting them (numbers, image paths,
/// markdown) is left to whoever renders the record.
pub type FieldValues = BTreeMap<String, String>;

/// A persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub fields: FieldValues,
}

impl Record {
    /// Returns the stored value for a bind key.
    pub fn get(&self, bind_key: &str) -> Option<&str> {
        self.fields.get(bind_key).map(String::as_str)
    }
}
