use assert_cmd::Command;
use lopdf::{dictionary, Document, Object, Stream};
use predicates::str::contains;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn blank_pdf() -> Vec<u8> {
    let mut doc = Document::new();
    let pages_id = doc.new_object_id();
    let contents = doc.add_object(Stream::new(dictionary! {}, b"0 0 m 1 1 l S".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => dictionary! {},
        "Contents" => contents,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![Object::from(page_id)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

/// Root with one Austin form, one company and one project
fn fixture() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    let form = root.join("templates").join("austin").join("building_permit");
    fs::create_dir_all(&form).unwrap();
    fs::write(form.join("blank.pdf"), blank_pdf()).unwrap();
    write_json(
        &form.join("fields.json"),
        &json!({ "company.name": { "page": 1, "x": 72, "y": 700 } }),
    );
    write_json(&form.join("layers.json"), &json!([]));

    let data = root.join("data");
    write_json(
        &data.join("forms_catalog.json"),
        &json!({
            "austin": {
                "building_permit": {
                    "name": "Building Permit",
                    "template_dir": "templates/austin/building_permit"
                }
            }
        }),
    );
    write_json(
        &data.join("companies.json"),
        &json!({ "acme": { "name": "ACME Roofing" } }),
    );
    write_json(
        &data.join("projects.json"),
        &json!({
            "p1": {
                "name": "Main St",
                "company_key": "acme",
                "forms": [{ "city": "austin", "form_key": "building_permit" }]
            }
        }),
    );
    tmp
}

fn cmd(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("permit-filler").unwrap();
    cmd.env_remove("PERMIT_FILLER_ROOT")
        .env_remove("PERMIT_FILLER_DATA_DIR")
        .env_remove("PERMIT_FILLER_OUTPUT_DIR")
        .env_remove("PERMIT_FILLER_COMPRESS")
        .env("RUST_LOG", "error")
        .arg("--root")
        .arg(root);
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_cities_and_forms() {
    let tmp = fixture();
    cmd(tmp.path())
        .arg("cities")
        .assert()
        .success()
        .stdout(contains("austin"));
    cmd(tmp.path())
        .args(["forms", "austin"])
        .assert()
        .success()
        .stdout(contains("building_permit\tBuilding Permit"));
}

#[test]
fn test_projects_json() {
    let tmp = fixture();
    let out = json_stdout(cmd(tmp.path()).args(["--json", "projects"]));
    assert_eq!(out["ok"], json!(true));
    assert_eq!(out["data"][0]["key"], json!("p1"));
    assert_eq!(out["data"][0]["forms_count"], json!(1));
}

#[test]
fn test_generate_project_writes_pdf() {
    let tmp = fixture();
    let out = json_stdout(cmd(tmp.path()).args(["--json", "generate", "project", "p1"]));
    let generated = out["data"]["generated"].as_array().unwrap();
    assert_eq!(generated.len(), 1);

    let path = PathBuf::from(generated[0].as_str().unwrap());
    assert!(path.ends_with("austin__building_permit.pdf"));
    assert!(Document::load(&path).is_ok());
}

#[test]
fn test_generate_project_with_zip() {
    let tmp = fixture();
    let out = json_stdout(cmd(tmp.path()).args(["--json", "generate", "project", "p1", "--zip"]));
    let archive = PathBuf::from(out["data"]["archive_path"].as_str().unwrap());
    assert!(archive.is_file());
    assert_eq!(archive.extension().unwrap(), "zip");
}

#[test]
fn test_generate_company() {
    let tmp = fixture();
    cmd(tmp.path())
        .args([
            "generate",
            "company",
            "acme",
            "--city",
            "austin",
            "--form",
            "building_permit",
            "--form",
            "missing_form",
        ])
        .assert()
        .success()
        .stdout(contains("generated"))
        .stdout(contains("skipped austin/missing_form"));
}

#[test]
fn test_missing_project_fails() {
    let tmp = fixture();
    cmd(tmp.path())
        .args(["--json", "generate", "project", "nope"])
        .assert()
        .failure()
        .stdout(contains("\"ok\": false"))
        .stdout(contains("nope"));
    assert!(!tmp.path().join("output").exists());
}

#[test]
fn test_unknown_dataset_fails() {
    let tmp = fixture();
    cmd(tmp.path())
        .args(["data", "invoices"])
        .assert()
        .failure()
        .stderr(contains("invoices"));
}

#[test]
fn test_data_catalog_alias() {
    let tmp = fixture();
    let out = json_stdout(cmd(tmp.path()).args(["--json", "data", "catalog"]));
    assert!(out["data"]["austin"]["building_permit"].is_object());
}

#[test]
fn test_doctor_reports_complete_catalog() {
    let tmp = fixture();
    cmd(tmp.path())
        .arg("doctor")
        .assert()
        .success()
        .stdout(contains("ok       austin/building_permit"))
        .stdout(contains("1 forms, 1 ok, 0 incomplete"));
}

#[test]
fn test_override_import_changes_resolution() {
    let tmp = fixture();
    let payload = tmp.path().join("acme_override.json");
    write_json(
        &payload,
        &json!({
            "company_key": "acme",
            "city": "austin",
            "form_key": "building_permit",
            "fields": { "company.name": { "page": 1, "x": 100, "y": 600 } },
            "layers": []
        }),
    );

    cmd(tmp.path())
        .args(["override", "import"])
        .arg(&payload)
        .assert()
        .success()
        .stdout(contains("saved override"));

    let out = json_stdout(cmd(tmp.path()).args([
        "--json",
        "resolve",
        "austin",
        "building_permit",
        "--company",
        "acme",
    ]));
    assert_eq!(out["data"]["status"], json!("resolved"));
    assert_eq!(out["data"]["source"], json!("override"));

    cmd(tmp.path())
        .args([
            "template",
            "fields",
            "austin",
            "building_permit",
            "--company",
            "acme",
            "--show",
        ])
        .assert()
        .success()
        .stdout(contains("\"x\": 100"));
}

#[test]
fn test_template_blank_path() {
    let tmp = fixture();
    cmd(tmp.path())
        .args(["template", "blank", "austin", "building_permit"])
        .assert()
        .success()
        .stdout(contains("blank.pdf"));
}
