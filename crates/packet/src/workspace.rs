//! Entry point tying settings, stores and the resolver together

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::overrides::{self, SavedOverride};
use crate::records::{Project, ProjectSummary};
use crate::resolver::{Resolution, TemplateResolver};
use crate::store::{StoreName, Stores};
use crate::{PacketError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use template::ValueTree;

/// A permit-filler data/output root
#[derive(Debug, Clone)]
pub struct Workspace {
    settings: Settings,
    stores: Stores,
    resolver: TemplateResolver,
}

impl Workspace {
    pub fn new(settings: Settings) -> Self {
        Self {
            stores: Stores::new(&settings.data_dir),
            resolver: TemplateResolver::new(settings.overrides_dir()),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    pub fn catalog(&self) -> Result<Catalog> {
        Ok(Catalog::from_map(self.stores.store(StoreName::FormsCatalog).load()?))
    }

    /// A project record; `NotFound` if absent or not an object
    pub fn project(&self, key: &str) -> Result<Project> {
        let record = self
            .stores
            .record(StoreName::Projects, key)?
            .ok_or_else(|| PacketError::NotFound(format!("project '{key}'")))?;
        serde_json::from_value(Value::Object(record))
            .map_err(|e| PacketError::InvalidInput(format!("project '{key}': {e}")))
    }

    /// Project summaries sorted by name (case-insensitive)
    pub fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        let projects = self.stores.store(StoreName::Projects).load()?;
        let mut summaries: Vec<ProjectSummary> = projects
            .into_iter()
            .filter(|(_, record)| record.is_object())
            .map(|(key, record)| {
                let project: Project = serde_json::from_value(record).unwrap_or_default();
                ProjectSummary {
                    name: if project.name.is_empty() {
                        key.clone()
                    } else {
                        project.name
                    },
                    company_key: project.company_key,
                    forms_count: project.forms.len(),
                    key,
                }
            })
            .collect();
        summaries.sort_by_key(|summary| summary.name.to_lowercase());
        Ok(summaries)
    }

    /// Value tree from linked records; absent links and records are empty
    pub fn value_tree(
        &self,
        company_key: Option<&str>,
        job_key: Option<&str>,
        owner_key: Option<&str>,
        roof_key: Option<&str>,
    ) -> Result<ValueTree> {
        let mut values = ValueTree::new();
        for (section, store, key) in [
            ("company", StoreName::Companies, company_key),
            ("job", StoreName::Jobs, job_key),
            ("owner", StoreName::Owners, owner_key),
            ("roof", StoreName::Roofs, roof_key),
        ] {
            let Some(key) = key.filter(|k| !k.trim().is_empty()) else {
                continue;
            };
            match self.stores.record(store, key)? {
                Some(record) => values = values.with_section(section, Value::Object(record)),
                None => tracing::warn!(section, key, "linked record not found, using empty"),
            }
        }
        Ok(values)
    }

    /// Resolve a catalog form's files; `NotFound` if it is not in the catalog
    pub fn resolve_form(
        &self,
        city: &str,
        form_key: &str,
        company_key: Option<&str>,
    ) -> Result<Resolution> {
        let catalog = self.catalog()?;
        self.resolve_in(&catalog, city, form_key, company_key)
    }

    pub(crate) fn resolve_in(
        &self,
        catalog: &Catalog,
        city: &str,
        form_key: &str,
        company_key: Option<&str>,
    ) -> Result<Resolution> {
        let entry = catalog.entry(city, form_key).ok_or_else(|| {
            PacketError::NotFound(format!("catalog entry {city}/{form_key}"))
        })?;
        let template_dir = self.settings.template_dir(&entry.template_dir);
        Ok(self
            .resolver
            .resolve(&template_dir, company_key, city, form_key))
    }

    /// The base blank document; overrides never replace it
    pub fn blank_pdf_path(&self, city: &str, form_key: &str) -> Result<PathBuf> {
        let resolution = self.resolve_form(city, form_key, None)?;
        existing(&resolution.files().blank, "blank document")
    }

    /// The fields file a render would use
    pub fn fields_json_path(
        &self,
        city: &str,
        form_key: &str,
        company_key: Option<&str>,
    ) -> Result<PathBuf> {
        let resolution = self.resolve_form(city, form_key, company_key)?;
        existing(&resolution.files().fields, "fields file")
    }

    /// The layers file a render would use
    pub fn layers_json_path(
        &self,
        city: &str,
        form_key: &str,
        company_key: Option<&str>,
    ) -> Result<PathBuf> {
        let resolution = self.resolve_form(city, form_key, company_key)?;
        existing(&resolution.files().layers, "layers file")
    }

    pub fn save_override(&self, payload: &Value) -> Result<SavedOverride> {
        overrides::save_override(&self.settings.overrides_dir(), payload)
    }

    pub fn import_override(&self, path: &Path) -> Result<SavedOverride> {
        overrides::import_override(&self.settings.overrides_dir(), path)
    }

    /// Zip a generated packet folder
    pub fn archive(&self, dir: &Path) -> Result<PathBuf> {
        crate::archive::archive_dir(&self.settings, dir)
    }
}

fn existing(path: &Path, what: &str) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(PacketError::NotFound(format!("{what} {}", path.display())))
    }
}
