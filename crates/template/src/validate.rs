//! Advisory checks on form definitions
//!
//! Nothing here stops a render. Issues are logged and returned in the
//! render report.

use crate::schema::{FieldMap, LayerEntry};
use crate::values::ValueTree;
use serde::Serialize;
use std::fmt;

/// Something questionable found while loading or checking definitions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// Definition file does not exist
    MissingDefinition { path: String },

    /// Definition file is not valid JSON or has the wrong top-level shape
    MalformedDefinition { file: String, reason: String },

    /// Field entry could not be read
    MalformedField { key: String, reason: String },

    /// Layer entry of a known type could not be read
    MalformedLayer { index: usize, reason: String },

    /// Layer entry with a missing or unsupported `type`
    UnknownLayerType { index: usize, kind: String },

    /// Field key not present in the value tree
    UnboundField { key: String },

    /// Field placed on a page the document does not have
    FieldPageOutOfRange { key: String, page: i64, page_count: usize },

    /// Layer placed on a page the document does not have
    LayerPageOutOfRange { index: usize, page: i64, page_count: usize },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDefinition { path } => write!(f, "definition file missing: {path}"),
            Self::MalformedDefinition { file, reason } => {
                write!(f, "{file} definition ignored: {reason}")
            }
            Self::MalformedField { key, reason } => {
                write!(f, "field '{key}' ignored: {reason}")
            }
            Self::MalformedLayer { index, reason } => {
                write!(f, "layer #{index} ignored: {reason}")
            }
            Self::UnknownLayerType { index, kind } => {
                write!(f, "layer #{index} has unknown type '{kind}'")
            }
            Self::UnboundField { key } => write!(f, "field '{key}' not found in data"),
            Self::FieldPageOutOfRange {
                key,
                page,
                page_count,
            } => write!(
                f,
                "field '{key}' targets page {page}, document has {page_count}"
            ),
            Self::LayerPageOutOfRange {
                index,
                page,
                page_count,
            } => write!(
                f,
                "layer #{index} targets page {page}, document has {page_count}"
            ),
        }
    }
}

/// Report field keys with no value and fields placed off the document
pub fn validate_fields(
    fields: &FieldMap,
    values: &ValueTree,
    page_count: usize,
) -> Vec<ValidationIssue> {
    let available = values.flatten_keys();
    let mut issues = Vec::new();

    for (key, field) in fields {
        if !available.contains(key) {
            issues.push(ValidationIssue::UnboundField { key: key.clone() });
        }
        if !page_in_range(field.page, page_count) {
            issues.push(ValidationIssue::FieldPageOutOfRange {
                key: key.clone(),
                page: field.page,
                page_count,
            });
        }
    }

    issues
}

/// Report layers placed off the document
pub fn validate_layers(layers: &[LayerEntry], page_count: usize) -> Vec<ValidationIssue> {
    layers
        .iter()
        .enumerate()
        .filter(|(_, layer)| !page_in_range(layer.page, page_count))
        .map(|(i, layer)| ValidationIssue::LayerPageOutOfRange {
            index: i + 1,
            page: layer.page,
            page_count,
        })
        .collect()
}

/// Log issues for one form at warn level
pub fn log_issues(form: &str, issues: &[ValidationIssue]) {
    if issues.is_empty() {
        tracing::debug!(form, "definitions valid");
        return;
    }
    for issue in issues {
        tracing::warn!(form, "{issue}");
    }
}

fn page_in_range(page: i64, page_count: usize) -> bool {
    page >= 1 && (page as u64) <= page_count as u64
}
