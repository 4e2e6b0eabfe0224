//! Catalog health check

use crate::resolver::{BLANK_FILE, FIELDS_FILE, LAYERS_FILE};
use crate::store::StoreName;
use crate::workspace::Workspace;
use crate::Result;
use serde::Serialize;
use std::path::PathBuf;

/// Status of one catalog form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorEntry {
    pub city: String,
    pub form_key: String,
    pub name: String,
    pub template_dir: Option<PathBuf>,
    pub ok: bool,
    /// File names (or `template_dir`) that could not be found
    pub missing: Vec<String>,
}

/// Status of the whole catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorReport {
    pub catalog_path: PathBuf,
    pub catalog_present: bool,
    pub total: usize,
    pub ok: usize,
    pub missing: usize,
    pub entries: Vec<DoctorEntry>,
}

impl Workspace {
    /// Check that every catalog form resolves to existing files
    pub fn doctor(&self) -> Result<DoctorReport> {
        let store = self.stores().store(StoreName::FormsCatalog);
        let catalog_path = store.path().to_path_buf();
        let catalog_present = catalog_path.is_file();
        if !catalog_present {
            tracing::warn!(path = %catalog_path.display(), "catalog file missing");
        }

        let catalog = self.catalog()?;
        let mut entries = Vec::new();
        for form in catalog.all_forms() {
            if form.template_dir.trim().is_empty() {
                entries.push(DoctorEntry {
                    city: form.city,
                    form_key: form.form_key,
                    name: form.name,
                    template_dir: None,
                    ok: false,
                    missing: vec!["template_dir".to_string()],
                });
                continue;
            }

            let template_dir = self.settings().template_dir(&form.template_dir);
            let resolution = self
                .resolver()
                .resolve(&template_dir, None, &form.city, &form.form_key);
            let files = resolution.files();
            let missing: Vec<String> = [
                (BLANK_FILE, &files.blank),
                (FIELDS_FILE, &files.fields),
                (LAYERS_FILE, &files.layers),
            ]
            .into_iter()
            .filter(|(_, path)| resolution.missing().contains(*path))
            .map(|(name, _)| name.to_string())
            .collect();

            if !missing.is_empty() {
                tracing::warn!(
                    city = %form.city,
                    form = %form.form_key,
                    ?missing,
                    "incomplete template"
                );
            }
            entries.push(DoctorEntry {
                ok: missing.is_empty(),
                city: form.city,
                form_key: form.form_key,
                name: form.name,
                template_dir: Some(template_dir),
                missing,
            });
        }

        let ok = entries.iter().filter(|entry| entry.ok).count();
        Ok(DoctorReport {
            catalog_path,
            catalog_present,
            total: entries.len(),
            ok,
            missing: entries.len() - ok,
            entries,
        })
    }
}
