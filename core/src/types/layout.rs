use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// One data file discovered under the root folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute (or root-joined) path to the file
    pub path: PathBuf,

    /// Path relative to the root folder
    pub relative: PathBuf,
}

impl FileRecord {
    /// Creates a record for `path` located under `root`
    ///
    /// Returns `None` if `path` is not inside `root`.
    pub fn new(root: &Path, path: PathBuf) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?.to_path_buf();
        Some(Self { path, relative })
    }
}

/// Sibling directories receiving the original and the anonymized files
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct DirectoryPair {
    /// `<root>/<identifier>`
    pub original: PathBuf,

    /// `<root>/<identifier><suffix>`
    pub anonymized: PathBuf,
}

impl DirectoryPair {
    /// Derives the pair of directory paths from the identifying value
    pub fn new(root: &Path, identifier: &str, anonymized_suffix: &str) -> Self {
        Self {
            original: root.join(identifier),
            anonymized: root.join(format!("{}{}", identifier, anonymized_suffix)),
        }
    }

    /// Destination of `file` inside the original directory
    pub fn original_path(&self, file: &FileRecord) -> PathBuf {
        self.original.join(&file.relative)
    }

    /// Destination of `file` inside the anonymized directory
    pub fn anonymized_path(&self, file: &FileRecord) -> PathBuf {
        self.anonymized.join(&file.relative)
    }

    /// Archive that replaces the original directory
    pub fn original_archive(&self) -> PathBuf {
        archive_path(&self.original)
    }

    /// Archive that replaces the anonymized directory
    pub fn anonymized_archive(&self) -> PathBuf {
        archive_path(&self.anonymized)
    }
}

/// `<directory>.zip`
pub fn archive_path(directory: &Path) -> PathBuf {
    let mut name: OsString = directory.as_os_str().to_owned();
    name.push(".zip");
    PathBuf::from(name)
}
