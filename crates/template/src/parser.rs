//! Definition JSON parsing
//!
//! Loading is lenient: a definition file that is missing, unparseable or of
//! the wrong shape degrades to an empty set, and a malformed entry is
//! dropped. Every such case is recorded as a [`ValidationIssue`] instead of
//! failing the render.

use crate::schema::{FieldDefinition, FieldMap, FormDefinition, LayerEntry, LAYER_TYPES};
use crate::validate::ValidationIssue;
use crate::{Result, TemplateError};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::Path;

/// Parse `fields.json` content, collecting anything dropped into `issues`
pub fn parse_fields(json: &str, issues: &mut Vec<ValidationIssue>) -> FieldMap {
    let mut fields = FieldMap::new();

    let root = match parse_root(json, "fields", issues) {
        Some(root) => root,
        None => return fields,
    };
    let entries = match root {
        Value::Object(entries) => entries,
        other => {
            issues.push(ValidationIssue::MalformedDefinition {
                file: "fields".to_string(),
                reason: format!("expected an object, found {}", json_kind(&other)),
            });
            return fields;
        }
    };

    for (key, entry) in entries {
        match serde_json::from_value::<FieldDefinition>(entry) {
            Ok(field) => {
                fields.insert(key, field);
            }
            Err(e) => issues.push(ValidationIssue::MalformedField {
                key,
                reason: e.to_string(),
            }),
        }
    }

    fields
}

/// Parse `layers.json` content, collecting anything dropped into `issues`
///
/// Layers keep their list order. Issue indexes are 1-based.
pub fn parse_layers(json: &str, issues: &mut Vec<ValidationIssue>) -> Vec<LayerEntry> {
    let mut layers = Vec::new();

    let root = match parse_root(json, "layers", issues) {
        Some(root) => root,
        None => return layers,
    };
    let entries = match root {
        Value::Array(entries) => entries,
        other => {
            issues.push(ValidationIssue::MalformedDefinition {
                file: "layers".to_string(),
                reason: format!("expected a list, found {}", json_kind(&other)),
            });
            return layers;
        }
    };

    for (i, entry) in entries.into_iter().enumerate() {
        let index = i + 1;

        let kind = entry.get("type").map(value_to_string).unwrap_or_default();
        if !entry.is_object() || !LAYER_TYPES.contains(&kind.as_str()) {
            issues.push(ValidationIssue::UnknownLayerType { index, kind });
            continue;
        }

        match serde_json::from_value::<LayerEntry>(entry) {
            Ok(layer) => layers.push(layer),
            Err(e) => issues.push(ValidationIssue::MalformedLayer {
                index,
                reason: e.to_string(),
            }),
        }
    }

    layers
}

/// Load `fields.json`; a missing file yields no fields
pub fn load_fields<P: AsRef<Path>>(path: P, issues: &mut Vec<ValidationIssue>) -> Result<FieldMap> {
    Ok(read_definition(path.as_ref(), issues)?
        .map(|json| parse_fields(&json, issues))
        .unwrap_or_default())
}

/// Load `layers.json`; a missing file yields no layers
pub fn load_layers<P: AsRef<Path>>(
    path: P,
    issues: &mut Vec<ValidationIssue>,
) -> Result<Vec<LayerEntry>> {
    Ok(read_definition(path.as_ref(), issues)?
        .map(|json| parse_layers(&json, issues))
        .unwrap_or_default())
}

impl FormDefinition {
    /// Load both definition files of a form
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(fields_path: P, layers_path: Q) -> Result<Self> {
        let mut issues = Vec::new();
        let fields = load_fields(fields_path, &mut issues)?;
        let layers = load_layers(layers_path, &mut issues)?;
        Ok(Self {
            fields,
            layers,
            issues,
        })
    }

    /// Build definitions from in-memory JSON
    pub fn from_json(fields_json: &str, layers_json: &str) -> Self {
        let mut issues = Vec::new();
        let fields = parse_fields(fields_json, &mut issues);
        let layers = parse_layers(layers_json, &mut issues);
        Self {
            fields,
            layers,
            issues,
        }
    }
}

/// Convert a JSON value to string for rendering
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn read_definition(path: &Path, issues: &mut Vec<ValidationIssue>) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(json) => Ok(Some(json)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            issues.push(ValidationIssue::MissingDefinition {
                path: path.display().to_string(),
            });
            Ok(None)
        }
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            issues.push(ValidationIssue::MalformedDefinition {
                file: path.display().to_string(),
                reason: e.to_string(),
            });
            Ok(None)
        }
        Err(source) => Err(TemplateError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_root(json: &str, file: &str, issues: &mut Vec<ValidationIssue>) -> Option<Value> {
    if json.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(json) {
        Ok(root) => Some(root),
        Err(e) => {
            issues.push(ValidationIssue::MalformedDefinition {
                file: file.to_string(),
                reason: e.to_string(),
            });
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
