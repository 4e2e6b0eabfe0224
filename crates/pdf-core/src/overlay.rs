//! Per-page overlay surface
//!
//! An overlay records drawing operators for one page, sized to that page.
//! Nothing touches the document until [`PdfDocument::merge_overlay`] is
//! called, which places the overlay on top of the original page content.
//!
//! [`PdfDocument::merge_overlay`]: crate::PdfDocument::merge_overlay

use crate::document::Color;
use crate::font::{StandardFont, CHECKMARK_CODE};
use crate::text::{
    encode_codes_hex, encode_win_ansi_hex, generate_line_operators, generate_text_operators,
    TextRenderContext,
};
use std::collections::BTreeSet;

/// Drawing surface for a single page (1-indexed)
#[derive(Debug, Clone)]
pub struct Overlay {
    page: usize,
    width: f64,
    height: f64,
    content: Vec<u8>,
    fonts: BTreeSet<StandardFont>,
    operations: usize,
}

impl Overlay {
    /// Create an empty overlay matching a page's dimensions
    pub fn new(page: usize, width: f64, height: f64) -> Self {
        Self {
            page,
            width,
            height,
            content: Vec::new(),
            fonts: BTreeSet::new(),
            operations: 0,
        }
    }

    /// Target page number (1-indexed)
    pub fn page(&self) -> usize {
        self.page
    }

    /// Whether a point lies on the surface (origin bottom-left)
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }

    /// Draw text with its baseline starting at `(x, y)`
    ///
    /// Empty text records nothing.
    pub fn draw_text(&mut self, text: &str, x: f64, y: f64, font_size: f64, font: StandardFont) {
        if text.is_empty() {
            return;
        }

        let ctx = TextRenderContext {
            font_name: font.resource_name().to_string(),
            font_size,
            color: Color::black(),
        };
        let ops = generate_text_operators(&encode_win_ansi_hex(text), x, y, &ctx);
        self.push(ops, Some(font));
    }

    /// Draw a straight segment from `(x1, y1)` to `(x2, y2)`
    pub fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64) {
        let ops = generate_line_operators(x1, y1, x2, y2, width, Color::black());
        self.push(ops, None);
    }

    /// Draw the checkmark glyph with its baseline at `(x, y)`
    pub fn draw_check(&mut self, x: f64, y: f64, size: f64) {
        let font = StandardFont::ZapfDingbats;
        let ctx = TextRenderContext {
            font_name: font.resource_name().to_string(),
            font_size: size,
            color: Color::black(),
        };
        let ops = generate_text_operators(&encode_codes_hex(&[CHECKMARK_CODE]), x, y, &ctx);
        self.push(ops, Some(font));
    }

    /// Whether nothing has been drawn
    pub fn is_empty(&self) -> bool {
        self.operations == 0
    }

    /// Number of drawing operations recorded
    pub fn operation_count(&self) -> usize {
        self.operations
    }

    /// Fonts referenced by the recorded content
    pub fn fonts(&self) -> impl Iterator<Item = StandardFont> + '_ {
        self.fonts.iter().copied()
    }

    /// Recorded content stream operators
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    fn push(&mut self, ops: Vec<u8>, font: Option<StandardFont>) {
        self.content.extend_from_slice(&ops);
        if let Some(font) = font {
            self.fonts.insert(font);
        }
        self.operations += 1;
    }
}
