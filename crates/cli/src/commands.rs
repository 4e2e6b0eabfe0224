use crate::cli::{Cli, Commands, GenerateCommands, OverrideCommands, TemplateCommands};
use crate::output::{print_one, print_out};
use anyhow::Context;
use packet::{
    ArchivedPacket, CompanyRequest, DoctorReport, PacketResult, Resolution, Settings, Source,
    Workspace,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::load(&cli.overrides()).context("loading settings")?;
    tracing::debug!(?settings, "settings loaded");
    let workspace = Workspace::new(settings);

    match &cli.command {
        Commands::Generate { command } => generate(&workspace, cli.json, command),
        Commands::Archive { dir } => {
            let archive_path = workspace.archive(dir)?;
            print_one(cli.json, PathOut { path: archive_path }, |p| {
                p.path.display().to_string()
            })
        }
        Commands::Resolve {
            city,
            form,
            company,
        } => {
            let resolution = workspace.resolve_form(city, form, company.as_deref())?;
            print_one(cli.json, resolution, render_resolution)
        }
        Commands::Template { command } => template(&workspace, cli.json, command),
        Commands::Override {
            command: OverrideCommands::Import { file },
        } => {
            let saved = workspace.import_override(file)?;
            print_one(cli.json, saved, |s| {
                format!("saved override in {}", s.dir.display())
            })
        }
        Commands::Projects => {
            let projects = workspace.list_projects()?;
            print_out(cli.json, &projects, |p| {
                format!(
                    "{}\t{}\t{}\t{} forms",
                    p.key,
                    p.name,
                    p.company_key.as_deref().unwrap_or("-"),
                    p.forms_count
                )
            })
        }
        Commands::Cities => {
            let cities = workspace.catalog()?.list_cities();
            print_out(cli.json, &cities, |c| c.clone())
        }
        Commands::Forms { city } => {
            let forms = workspace.catalog()?.list_forms_for_city(city);
            print_out(cli.json, &forms, |f| {
                format!("{}\t{}\t{}", f.form_key, f.name, f.template_dir)
            })
        }
        Commands::Data { name } => {
            let data = workspace.stores().load_data(name)?;
            if cli.json {
                print_one(true, data, |_| String::new())
            } else {
                println!("{}", serde_json::to_string_pretty(&data)?);
                Ok(())
            }
        }
        Commands::Doctor => {
            let report = workspace.doctor()?;
            print_one(cli.json, report, render_doctor)
        }
    }
}

fn generate(workspace: &Workspace, json: bool, command: &GenerateCommands) -> anyhow::Result<()> {
    match command {
        GenerateCommands::Project { key, zip: false } => {
            let packet = workspace.generate_project(key)?;
            print_one(json, packet, render_packet)
        }
        GenerateCommands::Project { key, zip: true } => {
            let archived = workspace.generate_and_archive_project(key)?;
            print_one(json, archived, render_archived)
        }
        GenerateCommands::Company {
            company,
            city,
            forms,
            job,
            owner,
            roof,
            zip,
        } => {
            let request = CompanyRequest {
                company_key: company.clone(),
                city: city.clone(),
                form_keys: forms.clone(),
                job_key: job.clone(),
                owner_key: owner.clone(),
                roof_key: roof.clone(),
            };
            if *zip {
                let archived = workspace.generate_and_archive_company(&request)?;
                print_one(json, archived, render_archived)
            } else {
                let packet = workspace.generate_company(&request)?;
                print_one(json, packet, render_packet)
            }
        }
    }
}

fn template(workspace: &Workspace, json: bool, command: &TemplateCommands) -> anyhow::Result<()> {
    let (path, show) = match command {
        TemplateCommands::Blank { city, form } => (workspace.blank_pdf_path(city, form)?, false),
        TemplateCommands::Fields {
            city,
            form,
            company,
            show,
        } => (
            workspace.fields_json_path(city, form, company.as_deref())?,
            *show,
        ),
        TemplateCommands::Layers {
            city,
            form,
            company,
            show,
        } => (
            workspace.layers_json_path(city, form, company.as_deref())?,
            *show,
        ),
    };

    if !show {
        return print_one(json, PathOut { path }, |p| p.path.display().to_string());
    }
    let content = read_json(&path)?;
    print_one(json, FileOut { path, content }, |f| {
        serde_json::to_string_pretty(&f.content).unwrap_or_default()
    })
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

#[derive(Serialize)]
struct PathOut {
    path: PathBuf,
}

#[derive(Serialize)]
struct FileOut {
    path: PathBuf,
    content: serde_json::Value,
}

fn render_packet(packet: &PacketResult) -> String {
    let mut lines = vec![format!("output: {}", packet.output_dir.display())];
    lines.extend(
        packet
            .generated
            .iter()
            .map(|path| format!("  generated {}", path.display())),
    );
    lines.extend(render_skipped(&packet.skipped));
    if let Some(warning) = &packet.warning {
        lines.push(format!("warning: {warning}"));
    }
    lines.join("\n")
}

fn render_archived(archived: &ArchivedPacket) -> String {
    let mut lines = vec![
        format!("output: {}", archived.output_dir.display()),
        format!("archive: {}", archived.archive_path.display()),
        format!("generated: {}", archived.generated.len()),
    ];
    lines.extend(render_skipped(&archived.skipped));
    lines.join("\n")
}

fn render_skipped(skipped: &[packet::SkippedForm]) -> Vec<String> {
    skipped
        .iter()
        .map(|s| format!("  skipped {}/{}: {}", s.city, s.form_key, s.reason))
        .collect()
}

fn render_resolution(resolution: &Resolution) -> String {
    let files = resolution.files();
    let source = match resolution.source() {
        Source::Base => "base",
        Source::Override => "override",
    };
    let mut lines = vec![
        format!("source: {source}"),
        format!("blank:  {}", files.blank.display()),
        format!("fields: {}", files.fields.display()),
        format!("layers: {}", files.layers.display()),
    ];
    lines.extend(
        resolution
            .missing()
            .iter()
            .map(|path| format!("missing: {}", path.display())),
    );
    lines.join("\n")
}

fn render_doctor(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    if !report.catalog_present {
        lines.push(format!(
            "catalog not found: {}",
            report.catalog_path.display()
        ));
    }
    for entry in &report.entries {
        if entry.ok {
            lines.push(format!("ok       {}/{}", entry.city, entry.form_key));
        } else {
            lines.push(format!(
                "missing  {}/{}: {}",
                entry.city,
                entry.form_key,
                entry.missing.join(", ")
            ));
        }
    }
    lines.push(format!(
        "{} forms, {} ok, {} incomplete",
        report.total, report.ok, report.missing
    ));
    lines.join("\n")
}
