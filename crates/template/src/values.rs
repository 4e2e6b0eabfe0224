//! Value tree bound into form fields

use crate::parser::value_to_string;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Top-level sections of a value tree
pub const SECTIONS: [&str; 4] = ["company", "job", "owner", "roof"];

/// Values available to field keys, grouped by section
///
/// A field key `company.name` reads `name` from the `company` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValueTree {
    #[serde(default)]
    pub company: Map<String, Value>,
    #[serde(default)]
    pub job: Map<String, Value>,
    #[serde(default)]
    pub owner: Map<String, Value>,
    #[serde(default)]
    pub roof: Map<String, Value>,
}

impl ValueTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one section; non-object records become an empty section
    pub fn with_section(mut self, name: &str, record: Value) -> Self {
        let record = match record {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Some(section) = self.section_mut(name) {
            *section = record;
        }
        self
    }

    /// Look up a section by name
    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        match name {
            "company" => Some(&self.company),
            "job" => Some(&self.job),
            "owner" => Some(&self.owner),
            "roof" => Some(&self.roof),
            _ => None,
        }
    }

    fn section_mut(&mut self, name: &str) -> Option<&mut Map<String, Value>> {
        match name {
            "company" => Some(&mut self.company),
            "job" => Some(&mut self.job),
            "owner" => Some(&mut self.owner),
            "roof" => Some(&mut self.roof),
            _ => None,
        }
    }

    /// Resolve a dotted field key, `""` when anything is missing
    pub fn lookup(&self, key: &str) -> String {
        key.split_once('.')
            .and_then(|(section, field)| self.section(section)?.get(field))
            .map(value_to_string)
            .unwrap_or_default()
    }

    /// Every dotted key present in the tree, descending into nested objects
    pub fn flatten_keys(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        for name in SECTIONS {
            if let Some(section) = self.section(name) {
                collect_keys(name, section, &mut keys);
            }
        }
        keys
    }

    /// The tree as a JSON object
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

fn collect_keys(prefix: &str, map: &Map<String, Value>, keys: &mut BTreeSet<String>) {
    for (key, value) in map {
        let full = format!("{prefix}.{key}");
        if let Value::Object(nested) = value {
            collect_keys(&full, nested, keys);
        } else {
            keys.insert(full);
        }
    }
}
