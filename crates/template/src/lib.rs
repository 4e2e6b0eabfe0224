//! Template Engine - form definitions and overlay rendering
//!
//! This crate provides:
//! - Field and layer definition schema types (`fields.json`, `layers.json`)
//! - Lenient definition loading (malformed input degrades to empty, with issues)
//! - The company/job/owner/roof value tree and dotted-key lookup
//! - Advisory validation of definitions against values and page counts
//! - Overlay rendering onto a blank form
//!
//! # Example
//!
//! ```ignore
//! use template::{render_form, ValueTree};
//!
//! let values = ValueTree::new().with_section("company", json!({ "name": "ACME" }));
//! let report = render_form("blank.pdf", "fields.json", "layers.json", &values, "out.pdf", true)?;
//! println!("{} fields drawn on {} pages", report.fields_drawn, report.pages);
//! ```

pub mod parser;
mod renderer;
mod schema;
pub mod validate;
mod values;

pub use parser::{load_fields, load_layers, parse_fields, parse_layers};
pub use renderer::{render_form, OverlayRenderer, RenderReport};
pub use schema::*;
pub use validate::ValidationIssue;
pub use values::{ValueTree, SECTIONS};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during template processing
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse definition: {0}")]
    ParseError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
