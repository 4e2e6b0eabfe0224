use clap::{Parser, Subcommand};
use packet::CliOverrides;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "permit-filler", version, about = "Fill permit PDF forms and package them")]
pub struct Cli {
    #[arg(long, global = true, help = "Root directory; catalog template paths are relative to it")]
    pub root: Option<PathBuf>,
    #[arg(long, global = true, help = "Config file (default: <root>/permit-filler.json)")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Directory holding the JSON stores and overrides")]
    pub data_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Directory receiving generated packets")]
    pub output_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Write uncompressed content streams")]
    pub no_compress: bool,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(long, global = true, help = "Emit logs as JSON lines on stderr")]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            root_dir: self.root.clone(),
            config_path: self.config.clone(),
            data_dir: self.data_dir.clone(),
            output_dir: self.output_dir.clone(),
            compress_streams: self.no_compress.then_some(false),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a packet of filled forms
    Generate {
        #[command(subcommand)]
        command: GenerateCommands,
    },
    /// Zip a generated packet folder
    Archive { dir: PathBuf },
    /// Show which files a form resolves to
    Resolve {
        city: String,
        form: String,
        #[arg(long)]
        company: Option<String>,
    },
    /// Locate a form's template files
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Manage company overrides
    Override {
        #[command(subcommand)]
        command: OverrideCommands,
    },
    /// List projects
    Projects,
    /// List catalog cities
    Cities,
    /// List catalog forms for a city
    Forms { city: String },
    /// Print a data set (projects, companies, jobs, owners, roofs, catalog)
    Data { name: String },
    /// Check that every catalog form has its files
    Doctor,
}

#[derive(Subcommand, Debug)]
pub enum GenerateCommands {
    /// All forms of a project
    Project {
        key: String,
        #[arg(long, default_value_t = false)]
        zip: bool,
    },
    /// Forms of one city for a company
    Company {
        company: String,
        #[arg(long)]
        city: String,
        #[arg(long = "form", required = true)]
        forms: Vec<String>,
        #[arg(long)]
        job: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        roof: Option<String>,
        #[arg(long, default_value_t = false)]
        zip: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// The blank document (never overridden)
    Blank { city: String, form: String },
    /// The fields file a render would use
    Fields {
        city: String,
        form: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long, help = "Print the file contents instead of its path")]
        show: bool,
    },
    /// The layers file a render would use
    Layers {
        city: String,
        form: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long, help = "Print the file contents instead of its path")]
        show: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum OverrideCommands {
    /// Import an override payload file
    Import { file: PathBuf },
}
