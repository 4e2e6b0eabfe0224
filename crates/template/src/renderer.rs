//! Overlay rendering onto a blank form

use crate::schema::{FormDefinition, LayerEntry, LayerKind};
use crate::validate::{log_issues, validate_fields, validate_layers, ValidationIssue};
use crate::values::ValueTree;
use crate::Result;
use pdf_core::{Overlay, PdfDocument, StandardFont};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// What a render drew and what it had to skip
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderReport {
    /// Pages in the output document
    pub pages: usize,
    /// Fields drawn with a non-empty value
    pub fields_drawn: usize,
    /// Layers drawn
    pub layers_drawn: usize,
    /// Field keys that resolved to an empty value
    pub empty_fields: Vec<String>,
    /// Advisory issues found while loading and checking definitions
    pub issues: Vec<ValidationIssue>,
}

/// Overlay renderer for one form definition
pub struct OverlayRenderer<'a> {
    /// Definitions to draw
    definition: &'a FormDefinition,
    /// Name used in log output
    form: String,
}

impl<'a> OverlayRenderer<'a> {
    /// Create a new renderer for a form definition
    pub fn new(definition: &'a FormDefinition) -> Self {
        Self {
            definition,
            form: String::from("form"),
        }
    }

    /// Set the form name used in log output
    pub fn with_form_name(mut self, form: impl Into<String>) -> Self {
        self.form = form.into();
        self
    }

    /// Draw fields and layers onto every page of `doc`
    ///
    /// Each page gets one overlay sized to that page. Fields are drawn
    /// first, then layers in list order. Pages with nothing to draw are left
    /// as they are.
    pub fn render(&self, doc: &mut PdfDocument, values: &ValueTree) -> Result<RenderReport> {
        let page_count = doc.page_count();
        let mut report = RenderReport {
            pages: page_count,
            ..Default::default()
        };

        report.issues.extend(self.definition.issues.iter().cloned());
        report.issues.extend(validate_fields(
            &self.definition.fields,
            values,
            page_count,
        ));
        report.issues.extend(validate_layers(&self.definition.layers, page_count));
        log_issues(&self.form, &report.issues);

        let mut layers_by_page: BTreeMap<i64, Vec<&LayerEntry>> = BTreeMap::new();
        for layer in &self.definition.layers {
            layers_by_page.entry(layer.page).or_default().push(layer);
        }

        for page in 1..=page_count {
            let (width, height) = doc.page_size(page)?;
            let mut overlay = Overlay::new(page, width, height);

            self.draw_fields(&mut overlay, values, &mut report);
            if let Some(layers) = layers_by_page.get(&(page as i64)) {
                self.draw_layers(&mut overlay, layers, &mut report);
            }

            if !doc.merge_overlay(&overlay)? {
                tracing::trace!(form = %self.form, page, "nothing to draw");
            }
        }

        tracing::debug!(
            form = %self.form,
            pages = report.pages,
            fields = report.fields_drawn,
            layers = report.layers_drawn,
            "rendered overlay"
        );
        Ok(report)
    }

    /// Render onto a blank document held in memory
    pub fn render_bytes(
        &self,
        blank: &[u8],
        values: &ValueTree,
        compress_streams: bool,
    ) -> Result<(Vec<u8>, RenderReport)> {
        let mut doc = PdfDocument::open_from_bytes(blank)?;
        doc.set_compress_streams(compress_streams);
        let report = self.render(&mut doc, values)?;
        Ok((doc.to_bytes()?, report))
    }

    /// Render a blank file to an output file
    pub fn render_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        blank_path: P,
        values: &ValueTree,
        out_path: Q,
        compress_streams: bool,
    ) -> Result<RenderReport> {
        let mut doc = PdfDocument::open(blank_path)?;
        doc.set_compress_streams(compress_streams);
        let report = self.render(&mut doc, values)?;
        doc.save(out_path)?;
        Ok(report)
    }

    fn draw_fields(&self, overlay: &mut Overlay, values: &ValueTree, report: &mut RenderReport) {
        let page = overlay.page() as i64;

        for (key, field) in self.definition.fields.iter().filter(|(_, f)| f.page == page) {
            let value = values.lookup(key);
            if value.is_empty() {
                tracing::warn!(form = %self.form, field = %key, "empty value");
                report.empty_fields.push(key.clone());
                continue;
            }

            if !overlay.contains(field.x, field.y) {
                tracing::debug!(
                    form = %self.form,
                    field = %key,
                    x = field.x,
                    y = field.y,
                    "outside page"
                );
            }
            overlay.draw_text(&value, field.x, field.y, field.font_size, StandardFont::Helvetica);
            report.fields_drawn += 1;
        }
    }

    fn draw_layers(
        &self,
        overlay: &mut Overlay,
        layers: &[&LayerEntry],
        report: &mut RenderReport,
    ) {
        for layer in layers {
            match &layer.kind {
                LayerKind::Line(line) => {
                    overlay.draw_line(line.x1, line.y1, line.x2, line.y2, line.width);
                }
                LayerKind::Check(check) => {
                    if !check.checked {
                        continue;
                    }
                    overlay.draw_check(check.x, check.y, check.size);
                }
                LayerKind::Text(text) => {
                    let value = text.text();
                    if value.is_empty() {
                        continue;
                    }
                    let font = StandardFont::Helvetica;
                    overlay.draw_text(&value, text.x, text.y, text.font_size, font);
                }
            }
            report.layers_drawn += 1;
        }
    }
}

/// Fill one form: load its definitions, draw them over the blank and save
///
/// Missing or malformed definition files draw nothing and are reported in
/// [`RenderReport::issues`]. The output has the same page count as the blank.
pub fn render_form<B, F, L, O>(
    blank_path: B,
    fields_path: F,
    layers_path: L,
    values: &ValueTree,
    out_path: O,
    compress_streams: bool,
) -> Result<RenderReport>
where
    B: AsRef<Path>,
    F: AsRef<Path>,
    L: AsRef<Path>,
    O: AsRef<Path>,
{
    let definition = FormDefinition::load(fields_path, layers_path)?;
    let form = blank_path
        .as_ref()
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("form"));

    OverlayRenderer::new(&definition)
        .with_form_name(form)
        .render_file(blank_path, values, out_path, compress_streams)
}
