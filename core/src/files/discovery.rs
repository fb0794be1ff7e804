use crate::error::{Result, ZapError};
use crate::types::{FileRecord, ZapConfig};
use log::{debug, info};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Files and subdirectories found under a root folder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    /// Candidate data files, in walk order
    pub files: Vec<FileRecord>,

    /// Subdirectories relative to the root, parents before children
    pub subdirs: Vec<PathBuf>,
}

impl Discovery {
    /// Picks the file whose values stand for the whole folder
    ///
    /// The first file carrying the DICOM preamble wins; if none does, the
    /// first file in walk order is used.
    pub fn representative(&self) -> Option<&FileRecord> {
        self.files
            .iter()
            .find(|file| is_dicom_file(&file.path))
            .or_else(|| self.files.first())
    }

    /// Drops everything located under `relative_dir`
    pub fn exclude(&mut self, relative_dir: &Path) {
        self.files.retain(|file| !file.relative.starts_with(relative_dir));
        self.subdirs.retain(|dir| !dir.starts_with(relative_dir));
    }
}

/// Walks `root` recursively and collects candidate data files
///
/// Entries are visited in file-name order, so walk order is deterministic.
/// Files whose name or extension is denied by the config are skipped.
///
/// # Errors
///
/// - `NotFound` if `root` is not a directory
/// - `EmptyDirectory` if any walked directory has no entry at all, or if no
///   candidate file was found. In resume mode empty branches are tolerated
///   and `*_anonymized` directories are not descended into.
pub fn discover(root: &Path, config: &ZapConfig) -> Result<Discovery> {
    if !root.is_dir() {
        return Err(ZapError::NotFound(root.to_path_buf()));
    }

    let mut discovery = Discovery::default();
    let mut walked_dirs = vec![root.to_path_buf()];

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(config.resume && is_anonymized_dir(entry, config)));

    for entry in walker {
        let entry = entry?;
        let path = entry.path().to_path_buf();

        if entry.file_type().is_dir() {
            if let Ok(relative) = path.strip_prefix(root) {
                discovery.subdirs.push(relative.to_path_buf());
            }
            walked_dirs.push(path);
        } else if entry.file_type().is_file() {
            let name = entry.file_name().to_string_lossy();
            if config.is_denied(&name) {
                debug!("Skipping non-DICOM file: {}", path.display());
                continue;
            }
            if let Some(record) = FileRecord::new(root, path) {
                discovery.files.push(record);
            }
        }
    }

    if !config.resume {
        for dir in &walked_dirs {
            if fs::read_dir(dir)?.next().is_none() {
                return Err(ZapError::EmptyDirectory(dir.clone()));
            }
        }
    }

    if discovery.files.is_empty() {
        return Err(ZapError::EmptyDirectory(root.to_path_buf()));
    }

    info!(
        "Found {} files in {} subdirectories under {}",
        discovery.files.len(),
        discovery.subdirs.len(),
        root.display()
    );

    Ok(discovery)
}

/// Lists every file under `directory`, relative to it, in file-name order
///
/// No filtering is applied; used to pick up files a previous run staged.
pub fn list_files(directory: &Path) -> Result<Vec<FileRecord>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(directory).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            if let Some(record) = FileRecord::new(directory, entry.into_path()) {
                files.push(record);
            }
        }
    }
    Ok(files)
}

fn is_anonymized_dir(entry: &DirEntry, config: &ZapConfig) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_string_lossy()
            .ends_with(&config.anonymized_suffix)
}

/// Checks if a file has a DICOM header
///
/// DICOM files typically have:
/// - 128-byte preamble
/// - 4-byte "DICM" magic string at offset 128
pub fn is_dicom_file(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    // Read first 132 bytes (128-byte preamble + 4-byte "DICM" magic)
    let mut buffer = [0u8; 132];
    match file.read_exact(&mut buffer) {
        Ok(()) => &buffer[128..132] == b"DICM",
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap().write_all(b"data").unwrap();
    }

    fn write_dicom_header(path: &Path) {
        let mut file = File::create(path).unwrap();
        file.write_all(&[0u8; 128]).unwrap();
        file.write_all(b"DICM").unwrap();
        file.write_all(b"additional data").unwrap();
    }

    fn relative_files(discovery: &Discovery) -> Vec<String> {
        discovery
            .files
            .iter()
            .map(|f| f.relative.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_discover_skips_denied_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "a.dcm");
        touch(root, "b.dcm");
        touch(root, "notes.txt");
        touch(root, "preview.PNG");
        touch(root, ".DS_Store");
        touch(root, "s1/c.dcm");
        touch(root, "s1/old.zip");

        let discovery = discover(root, &ZapConfig::default()).unwrap();

        assert_eq!(relative_files(&discovery), vec!["a.dcm", "b.dcm", "s1/c.dcm"]);
        assert_eq!(discovery.subdirs, vec![PathBuf::from("s1")]);
    }

    #[test]
    fn test_discover_nested_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "s1/s2/d.dcm");
        touch(root, "s3/e.dcm");

        let discovery = discover(root, &ZapConfig::default()).unwrap();

        assert_eq!(
            discovery.subdirs,
            vec![
                PathBuf::from("s1"),
                PathBuf::from("s1/s2"),
                PathBuf::from("s3")
            ]
        );
        assert_eq!(relative_files(&discovery), vec!["s1/s2/d.dcm", "s3/e.dcm"]);
    }

    #[test]
    fn test_discover_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        assert!(matches!(
            discover(&missing, &ZapConfig::default()),
            Err(ZapError::NotFound(_))
        ));
    }

    #[test]
    fn test_discover_empty_root() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            discover(temp_dir.path(), &ZapConfig::default()),
            Err(ZapError::EmptyDirectory(_))
        ));
    }

    #[test]
    fn test_discover_empty_branch_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "a.dcm");
        fs::create_dir(root.join("empty")).unwrap();

        match discover(root, &ZapConfig::default()) {
            Err(ZapError::EmptyDirectory(dir)) => assert_eq!(dir, root.join("empty")),
            other => panic!("expected EmptyDirectory, got {:?}", other),
        }
    }

    #[test]
    fn test_discover_only_denied_files_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "notes.txt");
        assert!(matches!(
            discover(temp_dir.path(), &ZapConfig::default()),
            Err(ZapError::EmptyDirectory(_))
        ));
    }

    #[test]
    fn test_discover_resume_tolerates_empty_and_skips_anonymized() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "b.dcm");
        fs::create_dir(root.join("s1")).unwrap();
        touch(root, "Jane Doe/a.dcm");
        touch(root, "Jane Doe_anonymized/a.dcm");

        let config = ZapConfig::default().resume(true);
        let mut discovery = discover(root, &config).unwrap();
        assert_eq!(relative_files(&discovery), vec!["Jane Doe/a.dcm", "b.dcm"]);

        discovery.exclude(Path::new("Jane Doe"));
        assert_eq!(relative_files(&discovery), vec!["b.dcm"]);
        assert_eq!(discovery.subdirs, vec![PathBuf::from("s1")]);
    }

    #[test]
    fn test_list_files_keeps_everything() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Jane Doe_anonymized");
        touch(&dir, "b.dcm.bak");
        touch(&dir, "a.dcm");
        touch(&dir, "s1/notes.txt");
        fs::create_dir_all(dir.join("s2")).unwrap();

        let files: Vec<PathBuf> = list_files(&dir)
            .unwrap()
            .into_iter()
            .map(|file| file.relative)
            .collect();

        assert_eq!(
            files,
            vec![
                PathBuf::from("a.dcm"),
                PathBuf::from("b.dcm.bak"),
                PathBuf::from("s1/notes.txt")
            ]
        );
    }

    #[test]
    fn test_representative_prefers_dicom_header() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "a_garbage");
        write_dicom_header(&root.join("b.dcm"));

        let discovery = discover(root, &ZapConfig::default()).unwrap();
        let sample = discovery.representative().unwrap();
        assert_eq!(sample.relative, PathBuf::from("b.dcm"));
    }

    #[test]
    fn test_representative_falls_back_to_first() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "b");
        touch(root, "a");

        let discovery = discover(root, &ZapConfig::default()).unwrap();
        assert_eq!(discovery.representative().unwrap().relative, PathBuf::from("a"));
    }

    #[test]
    fn test_is_dicom_file_with_valid_header() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test_dicom");
        write_dicom_header(&file_path);
        assert!(is_dicom_file(&file_path));
    }

    #[test]
    fn test_is_dicom_file_wrong_magic() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("wrong_magic");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(&[0u8; 128]).unwrap();
        file.write_all(b"NOTM").unwrap();

        assert!(!is_dicom_file(&file_path));
    }

    #[test]
    fn test_is_dicom_file_too_small() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("small_file");
        File::create(&file_path).unwrap().write_all(b"small").unwrap();
        assert!(!is_dicom_file(&file_path));
    }
}
