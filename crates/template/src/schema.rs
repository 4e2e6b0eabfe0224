//! Definition schema types for `fields.json` and `layers.json`

use crate::parser::value_to_string;
use crate::validate::ValidationIssue;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Default font size for field values and text layers
pub const DEFAULT_TEXT_SIZE: f64 = 10.0;

/// Default checkmark size
pub const DEFAULT_CHECK_SIZE: f64 = 12.0;

/// Default line width
pub const DEFAULT_LINE_WIDTH: f64 = 1.0;

/// Layer type names accepted in `layers.json`
pub const LAYER_TYPES: [&str; 3] = ["text", "check", "line"];

fn default_page() -> i64 {
    1
}

fn default_text_size() -> f64 {
    DEFAULT_TEXT_SIZE
}

fn default_check_size() -> f64 {
    DEFAULT_CHECK_SIZE
}

fn default_line_width() -> f64 {
    DEFAULT_LINE_WIDTH
}

fn default_checked() -> bool {
    true
}

/// Accept page numbers written as integers, floats or numeric strings
fn lenient_page<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid page: {n}"))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid page: {s:?}"))),
        serde_json::Value::Null => Ok(default_page()),
        other => Err(serde::de::Error::custom(format!("invalid page: {other}"))),
    }
}

/// Position of one bound value: `"company.name": { "page": 1, "x": 72, "y": 700 }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDefinition {
    /// Target page (1-indexed)
    #[serde(default = "default_page", deserialize_with = "lenient_page")]
    pub page: i64,

    /// X coordinate in points (from left)
    pub x: f64,

    /// Y coordinate in points (from bottom)
    pub y: f64,

    /// Font size in points
    #[serde(default = "default_text_size")]
    pub font_size: f64,
}

/// Field definitions keyed by dotted value key
pub type FieldMap = BTreeMap<String, FieldDefinition>;

/// One drawing instruction from `layers.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerEntry {
    /// Target page (1-indexed)
    #[serde(default = "default_page", deserialize_with = "lenient_page")]
    pub page: i64,

    /// Layer geometry and content
    #[serde(flatten)]
    pub kind: LayerKind,
}

/// Layer variants (tagged by `type`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    /// Literal text
    Text(TextLayer),

    /// Checkmark glyph
    Check(CheckLayer),

    /// Straight segment
    Line(LineLayer),
}

impl LayerKind {
    /// The `type` name of this layer
    pub fn type_name(&self) -> &'static str {
        match self {
            LayerKind::Text(_) => "text",
            LayerKind::Check(_) => "check",
            LayerKind::Line(_) => "line",
        }
    }
}

/// Text layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextLayer {
    pub x: f64,
    pub y: f64,

    /// Literal text; numbers and booleans are rendered as written
    #[serde(default)]
    pub value: serde_json::Value,

    #[serde(default = "default_text_size")]
    pub font_size: f64,
}

impl TextLayer {
    /// Text to draw
    pub fn text(&self) -> String {
        value_to_string(&self.value)
    }
}

/// Checkmark layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckLayer {
    pub x: f64,
    pub y: f64,

    #[serde(default = "default_check_size")]
    pub size: f64,

    /// Only an explicit `false` suppresses the mark
    #[serde(default = "default_checked")]
    pub checked: bool,
}

/// Line layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineLayer {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,

    #[serde(default = "default_line_width")]
    pub width: f64,
}

/// Field and layer definitions for one form, plus anything dropped on load
#[derive(Debug, Clone, Default)]
pub struct FormDefinition {
    pub fields: FieldMap,
    pub layers: Vec<LayerEntry>,
    /// Entries or files that were malformed and degraded to empty
    pub issues: Vec<ValidationIssue>,
}

impl FormDefinition {
    /// Whether nothing will be drawn from these definitions
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.layers.is_empty()
    }
}
