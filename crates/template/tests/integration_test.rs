//! Integration tests for form rendering

use lopdf::{dictionary, Document, Object, Stream};
use pdf_core::PdfDocument;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::{Path, PathBuf};
use template::{render_form, ValidationIssue, ValueTree};

fn write_blank(path: &Path, pages: usize) {
    let mut doc = Document::new();
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..pages {
        let contents = doc.add_object(Stream::new(dictionary! {}, b"0 0 m 5 5 l S".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {},
            "Contents" => contents,
        });
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => pages as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    doc.save(path).unwrap();
}

struct FormDir {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl FormDir {
    fn new(pages: usize, fields: &str, layers: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("building_permit");
        write_blank(&root.join("blank.pdf"), pages);
        std::fs::write(root.join("fields.json"), fields).unwrap();
        std::fs::write(root.join("layers.json"), layers).unwrap();
        Self { _dir: dir, root }
    }

    fn render(&self, values: &ValueTree) -> (template::RenderReport, PdfDocument) {
        let out = self.root.join("out").join("filled.pdf");
        let report = render_form(
            self.root.join("blank.pdf"),
            self.root.join("fields.json"),
            self.root.join("layers.json"),
            values,
            &out,
            false,
        )
        .unwrap();
        (report, PdfDocument::open(&out).unwrap())
    }
}

fn page_content(doc: &PdfDocument, page: usize) -> String {
    let page_id = doc.get_page_ids()[page - 1];
    let data = doc.inner().get_page_content(page_id).unwrap();
    String::from_utf8_lossy(&data).into_owned()
}

fn hex(text: &str) -> String {
    text.bytes().map(|b| format!("{b:02X}")).collect()
}

#[test]
fn test_render_fields_and_layers() {
    let form = FormDir::new(
        2,
        r#"{
            "company.name": { "page": 1, "x": 72, "y": 700, "font_size": 11 },
            "job.permit_no": { "page": 2, "x": 300, "y": 120 }
        }"#,
        r#"[
            { "type": "check", "page": 1, "x": 50, "y": 600 },
            { "type": "line", "page": 2, "x1": 10, "y1": 10, "x2": 200, "y2": 10, "width": 2 },
            { "type": "text", "page": 2, "x": 20, "y": 40, "value": "N/A" }
        ]"#,
    );
    let values = ValueTree::new()
        .with_section("company", json!({ "name": "ACME Roofing" }))
        .with_section("job", json!({ "permit_no": "BP-2024-17" }));

    let (report, doc) = form.render(&values);

    assert_eq!(report.pages, 2);
    assert_eq!(report.fields_drawn, 2);
    assert_eq!(report.layers_drawn, 3);
    assert!(report.issues.is_empty());

    let first = page_content(&doc, 1);
    assert!(first.starts_with("q\n0 0 m 5 5 l S"));
    assert!(first.contains(&format!("<{}> Tj", hex("ACME Roofing"))));
    assert!(first.contains("/PfHelv 11 Tf"));
    assert!(first.contains("/PfZaDb 12 Tf"));

    let second = page_content(&doc, 2);
    assert!(second.contains(&format!("<{}> Tj", hex("BP-2024-17"))));
    assert!(second.contains("2 w"));
    assert!(second.contains("200 10 l"));
    assert!(second.contains(&format!("<{}> Tj", hex("N/A"))));
}

#[test]
fn test_dotted_lookup_and_missing_values() {
    let form = FormDir::new(
        1,
        r#"{
            "job.address.city": { "x": 10, "y": 10 },
            "owner.name": { "x": 10, "y": 30 }
        }"#,
        "[]",
    );
    let values = ValueTree::new().with_section(
        "job",
        json!({ "address.city": "Springfield", "address": { "city": "Elsewhere" } }),
    );

    let (report, doc) = form.render(&values);

    let content = page_content(&doc, 1);
    assert!(content.contains(&hex("Springfield")));
    assert!(!content.contains(&hex("Elsewhere")));
    assert_eq!(report.empty_fields, vec!["owner.name".to_string()]);
}

#[test]
fn test_empty_values_keep_page_count() {
    let form = FormDir::new(
        3,
        r#"{ "company.name": { "page": 2, "x": 10, "y": 10 } }"#,
        "[]",
    );

    let (report, doc) = form.render(&ValueTree::new());

    assert_eq!(doc.page_count(), 3);
    assert_eq!(report.fields_drawn, 0);
    assert_eq!(report.empty_fields, vec!["company.name".to_string()]);
}

#[test]
fn test_unchecked_and_unknown_layers() {
    let form = FormDir::new(
        1,
        "{}",
        r#"[
            { "type": "check", "x": 50, "y": 50, "checked": false },
            { "type": "stamp", "x": 50, "y": 50 }
        ]"#,
    );

    let (report, doc) = form.render(&ValueTree::new());

    assert_eq!(report.layers_drawn, 0);
    assert_eq!(
        report.issues,
        vec![ValidationIssue::UnknownLayerType {
            index: 2,
            kind: "stamp".to_string()
        }]
    );
    assert!(!page_content(&doc, 1).contains("PfZaDb"));
}

#[test]
fn test_malformed_definitions_render_blank_copy() {
    let form = FormDir::new(2, r#"["not", "an", "object"]"#, r#"{ "not": "a list" }"#);

    let (report, doc) = form.render(&ValueTree::new());

    assert_eq!(doc.page_count(), 2);
    assert_eq!(report.fields_drawn + report.layers_drawn, 0);
    assert_eq!(report.issues.len(), 2);
    assert!(report
        .issues
        .iter()
        .all(|issue| matches!(issue, ValidationIssue::MalformedDefinition { .. })));
}

#[test]
fn test_missing_definition_files() {
    let form = FormDir::new(1, "{}", "[]");
    std::fs::remove_file(form.root.join("layers.json")).unwrap();

    let (report, doc) = form.render(&ValueTree::new());

    assert_eq!(doc.page_count(), 1);
    assert!(matches!(
        report.issues.as_slice(),
        [ValidationIssue::MissingDefinition { .. }]
    ));
}

#[test]
fn test_missing_blank_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = render_form(
        dir.path().join("blank.pdf"),
        dir.path().join("fields.json"),
        dir.path().join("layers.json"),
        &ValueTree::new(),
        dir.path().join("out.pdf"),
        true,
    );
    assert!(result.is_err());
}
