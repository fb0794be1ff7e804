use crate::error::{Result, ZapError};
use log::info;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Fails with `EmptyInput` unless `directory` holds at least one file
///
/// Mirrored subdirectories alone do not count as content.
pub fn ensure_non_empty(directory: &Path) -> Result<()> {
    for entry in WalkDir::new(directory).min_depth(1) {
        if entry?.file_type().is_file() {
            return Ok(());
        }
    }
    Err(ZapError::EmptyInput(directory.to_path_buf()))
}

/// Packages the contents of `directory` into `archive`
///
/// Entry names are relative to `directory`. Once the archive is written the
/// directory is deleted.
///
/// # Errors
///
/// - `EmptyInput` if the directory holds no file (no archive is created)
/// - `ArchiveCreation` if the archive is missing after writing it
pub fn zip_directory(directory: &Path, archive: &Path) -> Result<()> {
    ensure_non_empty(directory)?;
    write_archive(directory, archive)?;

    if !archive.exists() {
        return Err(ZapError::ArchiveCreation(archive.to_path_buf()));
    }

    fs::remove_dir_all(directory)?;
    info!("Created archive {}", archive.display());
    Ok(())
}

fn write_archive(directory: &Path, archive: &Path) -> Result<()> {
    let mut zip = ZipWriter::new(BufWriter::new(File::create(archive)?));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(directory).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let Some(name) = entry_name(directory, entry.path()) else {
            continue;
        };

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let mut source = File::open(entry.path())?;
            io::copy(&mut source, &mut zip)?;
        }
    }

    zip.finish()?;
    Ok(())
}

/// Archive entry name with `/` separators
fn entry_name(directory: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(directory).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
