//! Zip archives of generated packets

use crate::config::Settings;
use crate::{PacketError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip a folder under the output root into `{output_root}/_zips`
///
/// The folder must resolve (after following links) to a directory strictly
/// inside the output root and outside the archive folder; anything else is
/// `InvalidPath` and no archive is written. Entries are stored relative to
/// the folder.
pub fn archive_dir(settings: &Settings, dir: &Path) -> Result<PathBuf> {
    let root = settings.output_dir.canonicalize().map_err(|_| {
        PacketError::InvalidPath(format!(
            "output root {} does not exist",
            settings.output_dir.display()
        ))
    })?;
    let folder = dir.canonicalize().map_err(|_| {
        if lexically_inside(&settings.output_dir, dir) {
            PacketError::NotFound(format!("folder {}", dir.display()))
        } else {
            PacketError::InvalidPath(format!("{} is outside the output root", dir.display()))
        }
    })?;

    let zips_dir = root.join("_zips");
    if folder == root || !folder.starts_with(&root) || folder.starts_with(&zips_dir) {
        return Err(PacketError::InvalidPath(format!(
            "{} is outside the output root",
            dir.display()
        )));
    }
    if !folder.is_dir() {
        return Err(PacketError::InvalidInput(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let folder_name = folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "packet".to_string());
    std::fs::create_dir_all(&zips_dir).map_err(PacketError::io(&zips_dir))?;
    let archive_path = zips_dir.join(format!(
        "{folder_name}_{:08x}.zip",
        rand::random::<u32>()
    ));

    if let Err(e) = write_zip(&folder, &archive_path) {
        let _ = std::fs::remove_file(&archive_path);
        return Err(e);
    }

    tracing::info!(
        folder = %folder.display(),
        archive = %archive_path.display(),
        "archived packet"
    );
    Ok(archive_path)
}

fn write_zip(folder: &Path, archive_path: &Path) -> Result<()> {
    let file = File::create(archive_path).map_err(PacketError::io(archive_path))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(folder).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(folder).to_path_buf();
            PacketError::Io {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(folder).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name, options)?;
        let mut source = File::open(entry.path()).map_err(PacketError::io(entry.path()))?;
        std::io::copy(&mut source, &mut zip).map_err(PacketError::io(entry.path()))?;
    }

    let mut writer = zip.finish()?;
    writer.flush().map_err(PacketError::io(archive_path))?;
    Ok(())
}

fn lexically_inside(root: &Path, path: &Path) -> bool {
    use std::path::Component;

    !path.components().any(|c| c == Component::ParentDir) && path.starts_with(root)
}
