//! PDF Core - Low-level PDF overlay operations
//!
//! This crate provides functionality for:
//! - Opening and saving PDF documents
//! - Reading page dimensions (including inherited MediaBox)
//! - Recording text, line and checkmark drawing on a per-page overlay
//! - Merging an overlay onto an existing page in place
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Overlay, PdfDocument, StandardFont};
//!
//! let mut doc = PdfDocument::open("blank.pdf")?;
//! let (width, height) = doc.page_size(1)?;
//! let mut overlay = Overlay::new(1, width, height);
//! overlay.draw_text("ACME Roofing", 72.0, 700.0, 10.0, StandardFont::Helvetica);
//! overlay.draw_check(300.0, 650.0, 12.0);
//! doc.merge_overlay(&overlay)?;
//! doc.save("filled.pdf")?;
//! ```

mod document;
mod font;
mod overlay;
mod text;

pub use document::{Color, PdfDocument};
pub use font::StandardFont;
pub use overlay::Overlay;
pub use text::{
    encode_win_ansi_hex, generate_line_operators, generate_text_operators, TextRenderContext,
};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Page size used when a page carries no MediaBox anywhere in its tree (A4)
pub const DEFAULT_PAGE_SIZE: (f64, f64) = (595.28, 841.89);
