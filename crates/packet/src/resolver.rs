//! Template resolution
//!
//! Picks the blank document and field/layer definitions for a form:
//! 1. Each base file is taken from the top of the template directory, or
//!    else from the first depth-first match below it (a directory's files
//!    are visited before its subdirectories, entries in name order).
//! 2. A company override is used only when it has both `fields.json` and
//!    `layers.json`; it never replaces the blank document.

use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

pub const BLANK_FILE: &str = "blank.pdf";
pub const FIELDS_FILE: &str = "fields.json";
pub const LAYERS_FILE: &str = "layers.json";
pub const META_FILE: &str = "meta.json";

/// Where the field/layer definitions came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Base,
    Override,
}

/// The three files a render needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateFiles {
    pub blank: PathBuf,
    pub fields: PathBuf,
    pub layers: PathBuf,
}

impl TemplateFiles {
    fn missing(&self) -> Vec<PathBuf> {
        [&self.blank, &self.fields, &self.layers]
            .into_iter()
            .filter(|path| !path.is_file())
            .cloned()
            .collect()
    }
}

/// Outcome of resolving a form's files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Resolution {
    /// All three files exist
    Resolved { source: Source, files: TemplateFiles },
    /// Some files do not exist; their expected paths are listed
    Unresolved {
        source: Source,
        files: TemplateFiles,
        missing: Vec<PathBuf>,
    },
}

impl Resolution {
    pub fn files(&self) -> &TemplateFiles {
        match self {
            Resolution::Resolved { files, .. } | Resolution::Unresolved { files, .. } => files,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            Resolution::Resolved { source, .. } | Resolution::Unresolved { source, .. } => *source,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn missing(&self) -> &[PathBuf] {
        match self {
            Resolution::Resolved { .. } => &[],
            Resolution::Unresolved { missing, .. } => missing,
        }
    }

    /// Whether the blank document exists
    pub fn has_blank(&self) -> bool {
        !self.missing().contains(&self.files().blank)
    }
}

/// Resolves template files against an overrides root
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    overrides_root: PathBuf,
}

impl TemplateResolver {
    pub fn new(overrides_root: impl Into<PathBuf>) -> Self {
        Self {
            overrides_root: overrides_root.into(),
        }
    }

    /// Override directory for a company's copy of a form
    ///
    /// `None` when any key is not a single safe path component, the same
    /// rule `save_override` applies when writing.
    pub fn override_dir(&self, company_key: &str, city: &str, form_key: &str) -> Option<PathBuf> {
        let keys = [company_key.trim(), city.trim(), form_key.trim()];
        if !keys.iter().all(|key| is_path_key(key)) {
            tracing::warn!(company_key, city, form_key, "unsafe override key, using base template");
            return None;
        }
        Some(keys.iter().fold(self.overrides_root.clone(), |dir, key| dir.join(key)))
    }

    /// Resolve the files for one form
    ///
    /// Nothing is written and nothing fails here; files that do not exist
    /// are listed in [`Resolution::Unresolved`].
    pub fn resolve(
        &self,
        template_dir: &Path,
        company_key: Option<&str>,
        city: &str,
        form_key: &str,
    ) -> Resolution {
        let template_dir = absolutize(template_dir);
        let base = TemplateFiles {
            blank: locate(&template_dir, BLANK_FILE),
            fields: locate(&template_dir, FIELDS_FILE),
            layers: locate(&template_dir, LAYERS_FILE),
        };

        let company_override = company_key
            .map(str::trim)
            .filter(|company| !company.is_empty())
            .and_then(|company| self.override_dir(company, city, form_key))
            .map(|dir| (dir.join(FIELDS_FILE), dir.join(LAYERS_FILE)))
            .filter(|(fields, layers)| fields.is_file() && layers.is_file());

        let (source, files) = match company_override {
            Some((fields, layers)) => (
                Source::Override,
                TemplateFiles {
                    blank: base.blank,
                    fields,
                    layers,
                },
            ),
            None => (Source::Base, base),
        };
        tracing::debug!(city, form_key, ?source, "resolved template files");

        let missing = files.missing();
        if missing.is_empty() {
            Resolution::Resolved { source, files }
        } else {
            Resolution::Unresolved {
                source,
                files,
                missing,
            }
        }
    }
}

/// Whether a record key can be used as one override path component
///
/// Keys must be non-empty and free of separators, NUL and `..`.
pub fn is_path_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['/', '\\', '\0']) && key != "." && !key.contains("..")
}

/// `dir/name` if it exists, else the first depth-first match, else `dir/name`
pub fn locate(dir: &Path, name: &str) -> PathBuf {
    let direct = dir.join(name);
    if direct.exists() {
        return direct;
    }
    find_file(dir, name).unwrap_or(direct)
}

/// First file named `name` below `dir`, depth-first
pub fn find_file(dir: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .sort_by(files_first)
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| e.file_type().is_file() && e.file_name() == name)
        .map(DirEntry::into_path)
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
