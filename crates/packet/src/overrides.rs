//! Company override persistence
//!
//! An override is a company's own `fields.json`/`layers.json` for a catalog
//! form, stored under `overrides/{company}/{city}/{form}` with a `meta.json`.

use crate::resolver::{is_path_key, FIELDS_FILE, LAYERS_FILE, META_FILE};
use crate::store::write_json_atomic;
use crate::{PacketError, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Paths written by a save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedOverride {
    pub dir: PathBuf,
    pub fields: PathBuf,
    pub layers: PathBuf,
    pub meta: PathBuf,
}

/// Validate and write an override payload
///
/// The payload is `{company_key, city, form_key, fields, layers, meta?}`.
/// Nothing is written unless the whole payload is valid.
pub fn save_override(overrides_root: &Path, payload: &Value) -> Result<SavedOverride> {
    let Some(payload) = payload.as_object() else {
        return Err(PacketError::InvalidInput(
            "override payload must be an object".to_string(),
        ));
    };

    let company_key = path_key(payload, "company_key")?;
    let city = path_key(payload, "city")?;
    let form_key = path_key(payload, "form_key")?;

    let fields = match payload.get("fields") {
        Some(fields @ Value::Object(_)) => fields,
        _ => {
            return Err(PacketError::InvalidInput(
                "'fields' must be an object".to_string(),
            ))
        }
    };
    let layers = match payload.get("layers") {
        Some(layers @ Value::Array(_)) => layers,
        _ => {
            return Err(PacketError::InvalidInput(
                "'layers' must be a list".to_string(),
            ))
        }
    };
    let meta = match payload.get("meta") {
        Some(meta @ Value::Object(_)) => meta.clone(),
        _ => json!({
            "saved_at": timestamp(),
            "company_key": company_key,
            "city": city,
            "form_key": form_key,
        }),
    };

    let dir = overrides_root.join(&company_key).join(&city).join(&form_key);
    let saved = SavedOverride {
        fields: dir.join(FIELDS_FILE),
        layers: dir.join(LAYERS_FILE),
        meta: dir.join(META_FILE),
        dir,
    };
    write_json_atomic(&saved.fields, fields)?;
    write_json_atomic(&saved.layers, layers)?;
    write_json_atomic(&saved.meta, &meta)?;

    tracing::info!(
        company = %company_key,
        city = %city,
        form = %form_key,
        dir = %saved.dir.display(),
        "saved override"
    );
    Ok(saved)
}

/// Import an override payload from a JSON file
///
/// `meta.imported_at` and `meta.source_file` are filled in when absent.
pub fn import_override(overrides_root: &Path, path: &Path) -> Result<SavedOverride> {
    if !path.is_file() {
        return Err(PacketError::NotFound(format!(
            "override file {}",
            path.display()
        )));
    }
    let contents = std::fs::read_to_string(path).map_err(PacketError::io(path))?;
    if contents.trim().is_empty() {
        return Err(PacketError::InvalidInput(format!(
            "override file {} is empty",
            path.display()
        )));
    }
    let mut payload: Value = serde_json::from_str(&contents)
        .map_err(|e| PacketError::InvalidInput(format!("{}: {e}", path.display())))?;

    let Some(object) = payload.as_object_mut() else {
        return Err(PacketError::InvalidInput(
            "override payload must be an object".to_string(),
        ));
    };
    let mut meta = match object.remove("meta") {
        Some(Value::Object(meta)) => meta,
        _ => Map::new(),
    };
    meta.entry("imported_at").or_insert_with(|| json!(timestamp()));
    if let Some(file_name) = path.file_name() {
        meta.entry("source_file")
            .or_insert_with(|| json!(file_name.to_string_lossy()));
    }
    object.insert("meta".to_string(), Value::Object(meta));

    save_override(overrides_root, &payload)
}

/// A non-empty key that is safe as a single path component
fn path_key(payload: &Map<String, Value>, name: &str) -> Result<String> {
    let key = payload
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    if key.is_empty() {
        return Err(PacketError::InvalidInput(format!("'{name}' is required")));
    }
    if !is_path_key(key) {
        return Err(PacketError::InvalidInput(format!(
            "'{name}' must not contain path separators or '..': {key:?}"
        )));
    }
    Ok(key.to_string())
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn payload() -> Value {
        json!({
            "company_key": "acme",
            "city": "austin",
            "form_key": "building_permit",
            "fields": { "company.name": { "page": 1, "x": 80, "y": 710 } },
            "layers": [{ "type": "check", "x": 10, "y": 10 }]
        })
    }

    fn read(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_save_override_writes_three_files() {
        let root = tempfile::tempdir().unwrap();
        let saved = save_override(root.path(), &payload()).unwrap();

        assert_eq!(
            saved.dir,
            root.path().join("acme").join("austin").join("building_permit")
        );
        assert_eq!(read(&saved.fields), payload()["fields"]);
        assert_eq!(read(&saved.layers), payload()["layers"]);

        let meta = read(&saved.meta);
        assert_eq!(meta["company_key"], "acme");
        assert_eq!(meta["form_key"], "building_permit");
        assert!(meta["saved_at"].is_string());
    }

    #[test]
    fn test_supplied_meta_is_kept() {
        let root = tempfile::tempdir().unwrap();
        let mut payload = payload();
        payload["meta"] = json!({ "author": "pat" });

        let saved = save_override(root.path(), &payload).unwrap();
        assert_eq!(read(&saved.meta), json!({ "author": "pat" }));
    }

    #[test]
    fn test_wrong_shapes_write_nothing() {
        let root = tempfile::tempdir().unwrap();

        let mut bad_fields = payload();
        bad_fields["fields"] = json!([]);
        assert!(matches!(
            save_override(root.path(), &bad_fields),
            Err(PacketError::InvalidInput(_))
        ));

        let mut bad_layers = payload();
        bad_layers["layers"] = json!({});
        assert!(matches!(
            save_override(root.path(), &bad_layers),
            Err(PacketError::InvalidInput(_))
        ));

        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_keys_are_validated() {
        let root = tempfile::tempdir().unwrap();
        for (name, value) in [
            ("company_key", ""),
            ("city", "../etc"),
            ("form_key", "a/b"),
            ("company_key", ".."),
        ] {
            let mut payload = payload();
            payload[name] = json!(value);
            assert!(
                matches!(
                    save_override(root.path(), &payload),
                    Err(PacketError::InvalidInput(_))
                ),
                "{name}={value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_import_fills_meta() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("acme-bp.json");
        std::fs::write(&file, payload().to_string()).unwrap();

        let saved = import_override(&root.path().join("overrides"), &file).unwrap();
        let meta = read(&saved.meta);
        assert_eq!(meta["source_file"], "acme-bp.json");
        assert!(meta["imported_at"].is_string());
        assert!(meta.get("saved_at").is_none());
    }

    #[test]
    fn test_import_missing_and_empty() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            import_override(root.path(), &root.path().join("nope.json")),
            Err(PacketError::NotFound(_))
        ));

        let empty = root.path().join("empty.json");
        std::fs::write(&empty, "  ").unwrap();
        assert!(matches!(
            import_override(root.path(), &empty),
            Err(PacketError::InvalidInput(_))
        ));
    }
}
