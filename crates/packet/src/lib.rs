//! Packet - permit packet assembly
//!
//! This crate provides:
//! - Settings with CLI / environment / file / default layering
//! - JSON record stores with atomic replace
//! - Catalog queries over `forms_catalog`
//! - Template resolution with company overrides and nested layouts
//! - Override persistence and import
//! - Packet generation by project or by company, and zip archiving
//! - A catalog health check
//!
//! # Example
//!
//! ```ignore
//! use packet::{Settings, Workspace};
//!
//! let workspace = Workspace::new(Settings::with_root("/srv/permits"));
//! let packet = workspace.generate_project("smith-2024")?;
//! let archive = workspace.archive(&packet.output_dir)?;
//! ```

mod archive;
mod assembler;
pub mod catalog;
pub mod config;
mod doctor;
pub mod overrides;
pub mod records;
pub mod resolver;
pub mod store;
mod workspace;

pub use archive::archive_dir;
pub use assembler::{ArchivedPacket, CompanyRequest, PacketResult, SkippedForm};
pub use catalog::Catalog;
pub use config::{CliOverrides, Settings};
pub use doctor::{DoctorEntry, DoctorReport};
pub use overrides::SavedOverride;
pub use records::{CatalogEntry, FormRef, FormSummary, Project, ProjectSummary};
pub use resolver::{Resolution, Source, TemplateFiles, TemplateResolver};
pub use store::{JsonStore, StoreName, Stores};
pub use workspace::Workspace;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while resolving, generating or archiving packets
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template error: {0}")]
    Template(#[from] template::TemplateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl PacketError {
    /// Wrap an I/O error with the path it happened at
    pub fn io(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> PacketError {
        let path = path.as_ref().to_path_buf();
        move |source| PacketError::Io { path, source }
    }
}

/// Result type for packet operations
pub type Result<T> = std::result::Result<T, PacketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_helper_keeps_path() {
        let err = PacketError::io("/data/projects.json")(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.to_string(), "I/O error at /data/projects.json: denied");
    }

    #[test]
    fn test_not_found_message() {
        let err = PacketError::NotFound("project 'smith'".to_string());
        assert_eq!(err.to_string(), "Not found: project 'smith'");
    }
}
