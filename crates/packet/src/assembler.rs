//! Packet generation
//!
//! A packet is one output folder holding a filled PDF per requested form.
//! Forms that cannot be produced are skipped with a reason; only a missing
//! project or company stops the whole run.

use crate::catalog::Catalog;
use crate::records::{safe_component, FormRef};
use crate::workspace::Workspace;
use crate::{PacketError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use template::{render_form, RenderReport, ValueTree};

/// A form left out of a packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedForm {
    pub city: String,
    pub form_key: String,
    pub reason: String,
}

/// Result of a generation run
#[derive(Debug, Clone, Serialize)]
pub struct PacketResult {
    pub output_dir: PathBuf,
    /// Filled PDFs in request order
    pub generated: Vec<PathBuf>,
    pub skipped: Vec<SkippedForm>,
    /// Render reports keyed by output file name
    pub reports: BTreeMap<String, RenderReport>,
    /// Set when there was nothing to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Result of a generation run followed by archiving
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedPacket {
    pub output_dir: PathBuf,
    pub archive_path: PathBuf,
    pub generated: Vec<PathBuf>,
    pub skipped: Vec<SkippedForm>,
}

/// Ad hoc request: one company, one city, several forms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyRequest {
    pub company_key: String,
    /// Used for every form key in the request
    pub city: String,
    pub form_keys: Vec<String>,
    pub job_key: Option<String>,
    pub owner_key: Option<String>,
    pub roof_key: Option<String>,
}

impl Workspace {
    /// Generate the packet for a project
    ///
    /// Fails with `NotFound` before touching the filesystem if the project
    /// does not exist.
    pub fn generate_project(&self, project_key: &str) -> Result<PacketResult> {
        let project = self.project(project_key)?;
        let values = self.value_tree(
            project.company_key.as_deref(),
            project.job_key.as_deref(),
            project.owner_key.as_deref(),
            project.roof_key.as_deref(),
        )?;

        let forms = project.form_refs();
        let output_dir = self.new_output_dir(&[project_key])?;
        tracing::info!(
            project = project_key,
            forms = forms.len(),
            dir = %output_dir.display(),
            "generating project packet"
        );

        if forms.is_empty() {
            return Ok(empty_packet(output_dir, "project has no forms"));
        }
        self.render_forms(&forms, project.company_key.as_deref(), &values, output_dir)
    }

    /// Generate a packet for a company outside any project
    ///
    /// Fails with `NotFound` if the company record does not exist.
    pub fn generate_company(&self, request: &CompanyRequest) -> Result<PacketResult> {
        let company_key = request.company_key.trim();
        if self
            .stores()
            .record(crate::StoreName::Companies, company_key)?
            .is_none()
        {
            return Err(PacketError::NotFound(format!("company '{company_key}'")));
        }

        let values = self.value_tree(
            Some(company_key),
            request.job_key.as_deref(),
            request.owner_key.as_deref(),
            request.roof_key.as_deref(),
        )?;

        let forms: Vec<FormRef> = request
            .form_keys
            .iter()
            .map(|form_key| FormRef::new(request.city.trim(), form_key.trim()))
            .filter(FormRef::is_complete)
            .collect();
        let output_dir = self.new_output_dir(&[company_key, request.city.trim()])?;
        tracing::info!(
            company = company_key,
            city = %request.city,
            forms = forms.len(),
            dir = %output_dir.display(),
            "generating company packet"
        );

        if forms.is_empty() {
            return Ok(empty_packet(output_dir, "no forms requested"));
        }
        self.render_forms(&forms, Some(company_key), &values, output_dir)
    }

    /// Generate a project packet and zip it
    pub fn generate_and_archive_project(&self, project_key: &str) -> Result<ArchivedPacket> {
        let packet = self.generate_project(project_key)?;
        self.archive_packet(packet)
    }

    /// Generate a company packet and zip it
    pub fn generate_and_archive_company(&self, request: &CompanyRequest) -> Result<ArchivedPacket> {
        let packet = self.generate_company(request)?;
        self.archive_packet(packet)
    }

    fn archive_packet(&self, packet: PacketResult) -> Result<ArchivedPacket> {
        let archive_path = self.archive(&packet.output_dir)?;
        Ok(ArchivedPacket {
            output_dir: packet.output_dir,
            archive_path,
            generated: packet.generated,
            skipped: packet.skipped,
        })
    }

    fn render_forms(
        &self,
        forms: &[FormRef],
        company_key: Option<&str>,
        values: &ValueTree,
        output_dir: PathBuf,
    ) -> Result<PacketResult> {
        let catalog = self.catalog()?;
        let mut packet = PacketResult {
            output_dir,
            generated: Vec::new(),
            skipped: Vec::new(),
            reports: BTreeMap::new(),
            warning: None,
        };

        for form in forms {
            match self.render_one(&catalog, form, company_key, values, &packet.output_dir) {
                Ok((path, report)) => {
                    tracing::info!(path = %path.display(), "generated form");
                    packet.reports.insert(form.output_file_name(), report);
                    packet.generated.push(path);
                }
                Err(reason) => {
                    tracing::warn!(
                        city = %form.city,
                        form = %form.form_key,
                        %reason,
                        "skipping form"
                    );
                    packet.skipped.push(SkippedForm {
                        city: form.city.clone(),
                        form_key: form.form_key.clone(),
                        reason,
                    });
                }
            }
        }

        Ok(packet)
    }

    fn render_one(
        &self,
        catalog: &Catalog,
        form: &FormRef,
        company_key: Option<&str>,
        values: &ValueTree,
        output_dir: &Path,
    ) -> std::result::Result<(PathBuf, RenderReport), String> {
        let resolution = self
            .resolve_in(catalog, &form.city, &form.form_key, company_key)
            .map_err(|e| e.to_string())?;
        if !resolution.has_blank() {
            return Err(format!(
                "blank document missing: {}",
                resolution.files().blank.display()
            ));
        }

        let files = resolution.files();
        let out_path = output_dir.join(form.output_file_name());
        let report = render_form(
            &files.blank,
            &files.fields,
            &files.layers,
            values,
            &out_path,
            self.settings().compress_streams,
        )
        .map_err(|e| format!("render failed: {e}"))?;
        Ok((out_path, report))
    }

    /// Create `{parts joined by _}_{YYYYmmdd_HHMMSS}_{hex}` under the output root
    fn new_output_dir(&self, parts: &[&str]) -> Result<PathBuf> {
        let mut name: Vec<String> = parts
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| safe_component(part))
            .collect();
        name.push(chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
        name.push(format!("{:04x}", rand::random::<u16>()));

        let dir = self.settings().output_dir.join(name.join("_"));
        std::fs::create_dir_all(&dir).map_err(PacketError::io(&dir))?;
        Ok(dir)
    }
}

fn empty_packet(output_dir: PathBuf, warning: &str) -> PacketResult {
    tracing::warn!(dir = %output_dir.display(), "{warning}");
    PacketResult {
        output_dir,
        generated: Vec::new(),
        skipped: Vec::new(),
        reports: BTreeMap::new(),
        warning: Some(warning.to_string()),
    }
}
