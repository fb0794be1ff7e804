use crate::error::{Result, ZapError};
use crate::types::DirectoryPair;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Checks that an identifying value can name a directory under the root
///
/// Returns the trimmed value.
pub fn validate_identifier(value: &str) -> Result<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(ZapError::FileSystem(format!(
            "'{}' cannot be used as a directory name",
            value
        )));
    }
    if trimmed.contains(['/', '\\', '\0']) {
        return Err(ZapError::FileSystem(format!(
            "'{}' contains a path separator",
            value
        )));
    }
    Ok(trimmed)
}

/// Creates both directories of the pair plus the mirrored subdirectories
///
/// Both trees are complete before any file is moved.
///
/// # Errors
///
/// `FileSystem` if either directory already exists, unless `resume` is set
pub fn create_directories(pair: &DirectoryPair, subdirs: &[PathBuf], resume: bool) -> Result<()> {
    let dirs = [&pair.original, &pair.anonymized];
    if !resume {
        if let Some(existing) = dirs.iter().find(|dir| dir.exists()) {
            return Err(ZapError::FileSystem(format!(
                "{} already exists",
                existing.display()
            )));
        }
    }

    for dir in dirs {
        if dir.exists() {
            debug!("Reusing existing directory {}", dir.display());
        } else {
            fs::create_dir(dir)?;
        }
    }

    for subdir in subdirs {
        fs::create_dir_all(pair.original.join(subdir))?;
        fs::create_dir_all(pair.anonymized.join(subdir))?;
    }

    Ok(())
}

/// Moves a file, falling back to copy-then-remove across filesystems
///
/// The source is only removed once the copy is complete.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    ensure_parent(to)?;
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    debug!("Moved {} -> {}", from.display(), to.display());
    Ok(())
}

/// Copies a file, creating the destination parent if needed
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    ensure_parent(to)?;
    fs::copy(from, to)?;
    debug!("Copied {} -> {}", from.display(), to.display());
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Removes the emptied subdirectory skeletons left in the root
///
/// Deepest directories go first. A directory that cannot be removed (for
/// instance because it still holds skipped files) is logged and the others
/// are still attempted. Returns the number of directories removed.
pub fn remove_skeletons(root: &Path, subdirs: &[PathBuf]) -> usize {
    let mut ordered: Vec<&PathBuf> = subdirs.iter().collect();
    ordered.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));

    let mut removed = 0;
    for subdir in ordered {
        let path = root.join(subdir);
        match fs::remove_dir(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not remove {}: {}", path.display(), e),
        }
    }
    removed
}
