use crate::backend::{read_catalog_values, DicomBackend, ZapReport};
use crate::catalog::FieldCatalog;
use crate::error::{Result, ZapError};
use crate::files::{
    create_directories, discover, ensure_non_empty, list_files, remove_skeletons,
    validate_identifier, zip_directory,
};
use crate::types::{BackendKind, DirectoryPair, FieldKey, ZapConfig, ZappingPlan};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Orchestrates one anonymization run over a DICOM folder
///
/// Discovers the files, reads the catalog values from a representative file,
/// applies operator overrides, plans the field rewrites, splits every file
/// into an original and an anonymized directory and finally replaces both
/// directories with ZIP archives.
///
/// Fatal errors abort the run where they occur. Files already relocated stay
/// where they are; rerun with `resume` to finish the job. A resumed run
/// rewrites every file already staged in the anonymized directory before
/// zapping what is left in the root.
///
/// # Example
///
/// ```no_run
/// use dicomzap_core::{select_backend, Anonymizer, FieldCatalog, ZapConfig};
/// use std::path::Path;
///
/// let config = ZapConfig::default();
/// let backend = select_backend(&config)?;
/// let mut catalog = FieldCatalog::default_catalog()?;
///
/// let summary = Anonymizer::new(&config, backend.as_ref())
///     .run(Path::new("/study"), &mut catalog, &[])?;
/// println!("{:?}", summary.anonymized_archive);
/// # Ok::<(), dicomzap_core::ZapError>(())
/// ```
pub struct Anonymizer<'a> {
    config: &'a ZapConfig,
    backend: &'a dyn DicomBackend,
}

impl<'a> Anonymizer<'a> {
    /// Creates an orchestrator bound to a configuration and a backend
    pub fn new(config: &'a ZapConfig, backend: &'a dyn DicomBackend) -> Self {
        Self { config, backend }
    }

    /// Runs the whole pipeline on `root`
    ///
    /// `updates` are operator overrides applied after the values are read;
    /// each must name an editable catalog field.
    pub fn run(
        &self,
        root: &Path,
        catalog: &mut FieldCatalog,
        updates: &[(FieldKey, String)],
    ) -> Result<RunSummary> {
        let mut discovery = discover(root, self.config)?;
        let sample = discovery
            .representative()
            .map(|file| file.path.clone())
            .ok_or_else(|| ZapError::EmptyDirectory(root.to_path_buf()))?;

        let values_read = read_catalog_values(self.backend, &sample, catalog)?;

        // The directory name comes from the value on disk, not from an override
        let key = self.config.identifying_field;
        let identifier = catalog
            .value_of(&key)
            .ok_or_else(|| ZapError::MissingIdentifier(key.to_string()))
            .and_then(validate_identifier)?
            .to_string();

        for (key, value) in updates {
            catalog.apply_update(key, value.clone())?;
        }

        let plan = catalog.plan();
        let pair = DirectoryPair::new(root, &identifier, &self.config.anonymized_suffix);
        info!(
            "{} of {} fields will be zapped",
            plan.changed_fields_count(),
            catalog.len()
        );
        if plan.is_identity() {
            warn!("No field changes, {} will stay empty", pair.anonymized.display());
        }

        if self.config.resume {
            discovery.exclude(Path::new(&identifier));
        }

        let mut summary = RunSummary {
            root: root.to_path_buf(),
            identifier,
            backend: self.backend.kind(),
            representative: sample,
            values_read,
            changed_fields: plan.changed_fields_count(),
            plan,
            dry_run: self.config.dry_run,
            files: discovery.files.len(),
            report: ZapReport::default(),
            original_archive: None,
            anonymized_archive: None,
            removed_directories: 0,
        };

        if self.config.dry_run {
            info!("Dry run, leaving {} untouched", root.display());
            return Ok(summary);
        }

        create_directories(&pair, &discovery.subdirs, self.config.resume)?;

        if self.config.resume {
            let staged = list_files(&pair.anonymized)?;
            if !staged.is_empty() {
                info!(
                    "Rewriting {} files staged in {}",
                    staged.len(),
                    pair.anonymized.display()
                );
                summary.report = self.backend.rezap(&staged, &pair, &summary.plan)?;
            }
        }

        let report = self.backend.zap(&discovery.files, &pair, &summary.plan)?;
        summary.report.extend(report);

        for dir in [&pair.original, &pair.anonymized] {
            if !dir.is_dir() {
                return Err(ZapError::AnonymizationFailed(dir.clone()));
            }
        }

        // Both must have content before either is archived
        ensure_non_empty(&pair.original)?;
        ensure_non_empty(&pair.anonymized)?;

        let original_archive = pair.original_archive();
        let anonymized_archive = pair.anonymized_archive();
        zip_directory(&pair.original, &original_archive)?;
        zip_directory(&pair.anonymized, &anonymized_archive)?;

        if original_archive.exists() && anonymized_archive.exists() {
            summary.removed_directories = remove_skeletons(root, &discovery.subdirs);
        }
        summary.original_archive = Some(original_archive);
        summary.anonymized_archive = Some(anonymized_archive);

        Ok(summary)
    }
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct RunSummary {
    /// Folder that was processed
    pub root: PathBuf,

    /// Identifying value naming the directories and archives
    pub identifier: String,

    /// Backend used
    pub backend: BackendKind,

    /// File the catalog values were read from
    pub representative: PathBuf,

    /// Number of catalog fields that received a value
    pub values_read: usize,

    /// Per-field decisions
    pub plan: ZappingPlan,

    /// Number of fields blanked or replaced
    pub changed_fields: usize,

    /// Whether the filesystem was left untouched
    pub dry_run: bool,

    /// Number of data files processed
    pub files: usize,

    /// Where the files ended up
    pub report: ZapReport,

    /// `<root>/<identifier>.zip`
    pub original_archive: Option<PathBuf>,

    /// `<root>/<identifier>_anonymized.zip`
    pub anonymized_archive: Option<PathBuf>,

    /// Emptied subdirectories removed from the root
    pub removed_directories: usize,
}

#[cfg(all(test, feature = "library"))]
mod tests {
    use super::*;
    use crate::backend::fixtures::write_dicom;
    use crate::backend::tags::{get_string_value, PATIENT_AGE, PATIENT_NAME};
    use crate::backend::LibraryBackend;
    use dicom_object::open_file;
    use std::collections::BTreeSet;
    use std::fs::{self, File};
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    const PATIENT_AGE_KEY: FieldKey = FieldKey::new(0x0010, 0x1010);

    fn study() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_dicom(&root.join("a.dcm"), "Jane Doe", "1.2.3.4.1");
        write_dicom(&root.join("b.dcm"), "Jane Doe", "1.2.3.4.2");
        write_dicom(&root.join("s1/c.dcm"), "Jane Doe", "1.2.3.4.3");
        temp
    }

    fn name_only_catalog() -> FieldCatalog {
        FieldCatalog::from_xml(
            r#"<data><item><name>0010,0010</name><description>PatientName</description><editable>no</editable></item></data>"#,
        )
        .unwrap()
    }

    fn archive_names(path: &Path) -> BTreeSet<String> {
        let zip = ZipArchive::new(File::open(path).unwrap()).unwrap();
        zip.file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect()
    }

    /// Extracts one entry to a file so it can be opened as DICOM
    fn extract(archive: &Path, name: &str, into: &Path) -> PathBuf {
        let mut zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
        let mut bytes = Vec::new();
        zip.by_name(name).unwrap().read_to_end(&mut bytes).unwrap();
        let out = into.join(name.replace('/', "_"));
        fs::write(&out, bytes).unwrap();
        out
    }

    fn value(path: &Path, tag: dicom_core::Tag) -> String {
        get_string_value(&open_file(path).unwrap(), tag).unwrap_or_default()
    }

    #[test]
    fn test_study_scenario() {
        let temp = study();
        let root = temp.path();
        let config = ZapConfig::default();
        let backend = LibraryBackend::new();
        let mut catalog = name_only_catalog();

        let summary = Anonymizer::new(&config, &backend)
            .run(root, &mut catalog, &[])
            .unwrap();

        assert_eq!(summary.identifier, "Jane Doe");
        assert_eq!(summary.changed_fields, 1);
        assert_eq!(summary.files, 3);

        let original_zip = root.join("Jane Doe.zip");
        let anonymized_zip = root.join("Jane Doe_anonymized.zip");
        assert_eq!(summary.original_archive.as_deref(), Some(original_zip.as_path()));
        assert_eq!(
            summary.anonymized_archive.as_deref(),
            Some(anonymized_zip.as_path())
        );

        // directories replaced by archives, root files and skeletons gone
        assert!(!root.join("Jane Doe").exists());
        assert!(!root.join("Jane Doe_anonymized").exists());
        assert!(!root.join("a.dcm").exists());
        assert!(!root.join("s1").exists());

        let expected: BTreeSet<String> = ["a.dcm", "b.dcm", "s1/c.dcm"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(archive_names(&original_zip), expected);
        assert_eq!(archive_names(&anonymized_zip), expected);

        let scratch = TempDir::new().unwrap();
        for name in &expected {
            let original = extract(&original_zip, name, scratch.path());
            assert_eq!(value(&original, PATIENT_NAME), "Jane Doe");
            let anonymized = extract(&anonymized_zip, name, scratch.path());
            assert_eq!(value(&anonymized, PATIENT_NAME), "");
        }
    }

    #[test]
    fn test_operator_override_replaces_value() {
        let temp = study();
        let root = temp.path();
        let config = ZapConfig::default();
        let backend = LibraryBackend::new();
        let mut catalog = FieldCatalog::default_catalog().unwrap();

        let summary = Anonymizer::new(&config, &backend)
            .run(root, &mut catalog, &[(PATIENT_AGE_KEY, "050Y".to_string())])
            .unwrap();

        let anonymized_zip = summary.anonymized_archive.unwrap();
        let original_zip = summary.original_archive.unwrap();
        let scratch = TempDir::new().unwrap();
        let anonymized = extract(&anonymized_zip, "s1/c.dcm", scratch.path());
        assert_eq!(value(&anonymized, PATIENT_AGE), "050Y");
        let original = extract(&original_zip, "b.dcm", scratch.path());
        assert_eq!(value(&original, PATIENT_AGE), "040Y");
    }

    #[test]
    fn test_non_editable_override_is_rejected_before_moving() {
        let temp = study();
        let root = temp.path();
        let config = ZapConfig::default();
        let backend = LibraryBackend::new();
        let mut catalog = name_only_catalog();

        let result = Anonymizer::new(&config, &backend).run(
            root,
            &mut catalog,
            &[(FieldKey::new(0x0010, 0x0010), "X".to_string())],
        );

        assert!(matches!(result, Err(ZapError::InvalidUpdate(_))));
        assert!(root.join("a.dcm").exists());
        assert!(!root.join("Jane Doe").exists());
    }

    #[test]
    fn test_identity_plan_fails_before_archiving() {
        let temp = study();
        let root = temp.path();
        let config = ZapConfig::default();
        let backend = LibraryBackend::new();
        // PatientName editable and not updated: nothing gets zapped
        let mut catalog = FieldCatalog::from_xml(
            r#"<data><item><name>0010,0010</name><description>PatientName</description><editable>yes</editable></item></data>"#,
        )
        .unwrap();

        let result = Anonymizer::new(&config, &backend).run(root, &mut catalog, &[]);

        assert!(matches!(result, Err(ZapError::EmptyInput(_))));
        assert!(root.join("Jane Doe/a.dcm").exists());
        assert!(root.join("Jane Doe/s1/c.dcm").exists());
        assert!(!root.join("Jane Doe.zip").exists());
        assert!(!root.join("Jane Doe_anonymized.zip").exists());
    }

    #[test]
    fn test_missing_identifier() {
        let temp = study();
        let config = ZapConfig::default();
        let backend = LibraryBackend::new();
        let mut catalog = FieldCatalog::from_xml(
            r#"<data><item><name>0010,0020</name><description>PatientID</description><editable>no</editable></item></data>"#,
        )
        .unwrap();

        let result = Anonymizer::new(&config, &backend).run(temp.path(), &mut catalog, &[]);
        assert!(matches!(result, Err(ZapError::MissingIdentifier(_))));
    }

    #[test]
    fn test_existing_directory_is_not_overwritten() {
        let temp = study();
        let root = temp.path();
        fs::create_dir(root.join("Jane Doe_anonymized")).unwrap();
        fs::write(root.join("Jane Doe_anonymized/keep.txt"), b"keep").unwrap();
        let config = ZapConfig::default();
        let backend = LibraryBackend::new();

        let result =
            Anonymizer::new(&config, &backend).run(root, &mut name_only_catalog(), &[]);

        assert!(matches!(result, Err(ZapError::FileSystem(_))));
        assert!(root.join("a.dcm").exists());
        assert!(!root.join("Jane Doe").exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = study();
        let root = temp.path();
        let config = ZapConfig::default().dry_run(true);
        let backend = LibraryBackend::new();

        let summary = Anonymizer::new(&config, &backend)
            .run(root, &mut name_only_catalog(), &[])
            .unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.changed_fields, 1);
        assert!(summary.original_archive.is_none());
        assert!(root.join("a.dcm").exists());
        assert!(!root.join("Jane Doe").exists());
    }

    #[test]
    fn test_resume_finishes_interrupted_run() {
        let temp = study();
        let root = temp.path();
        // interrupted run: a.dcm already split, the rest still in place
        fs::create_dir_all(root.join("Jane Doe/s1")).unwrap();
        fs::create_dir_all(root.join("Jane Doe_anonymized/s1")).unwrap();
        fs::rename(root.join("a.dcm"), root.join("Jane Doe/a.dcm")).unwrap();
        write_dicom(&root.join("Jane Doe_anonymized/a.dcm"), "", "1.2.3.4.1");

        let config = ZapConfig::default().resume(true);
        let backend = LibraryBackend::new();
        let summary = Anonymizer::new(&config, &backend)
            .run(root, &mut name_only_catalog(), &[])
            .unwrap();

        assert_eq!(summary.identifier, "Jane Doe");
        assert_eq!(summary.files, 2);
        let expected: BTreeSet<String> = ["a.dcm", "b.dcm", "s1/c.dcm"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(archive_names(&root.join("Jane Doe.zip")), expected);
        assert_eq!(archive_names(&root.join("Jane Doe_anonymized.zip")), expected);
    }

    #[test]
    fn test_resume_rewrites_copies_staged_by_failed_run() {
        let temp = study();
        let root = temp.path();
        // no denied extension, so it is staged and breaks the rewrite pass
        fs::write(root.join("0_notes"), b"not dicom").unwrap();
        let backend = LibraryBackend::new();

        let result = Anonymizer::new(&ZapConfig::default(), &backend).run(
            root,
            &mut name_only_catalog(),
            &[],
        );
        assert!(matches!(result, Err(ZapError::Dicom(_))));
        let staged = root.join("Jane Doe_anonymized/a.dcm");
        assert_eq!(value(&staged, PATIENT_NAME), "Jane Doe");

        // the unreadable file is still staged, so resuming fails again
        let config = ZapConfig::default().resume(true);
        let result =
            Anonymizer::new(&config, &backend).run(root, &mut name_only_catalog(), &[]);
        assert!(result.is_err());
        assert!(!root.join("Jane Doe_anonymized.zip").exists());

        fs::remove_file(root.join("Jane Doe/0_notes")).unwrap();
        fs::remove_file(root.join("Jane Doe_anonymized/0_notes")).unwrap();
        let summary = Anonymizer::new(&config, &backend)
            .run(root, &mut name_only_catalog(), &[])
            .unwrap();

        assert_eq!(summary.files, 0);
        assert_eq!(summary.report.anonymized.len(), 3);
        let anonymized_zip = root.join("Jane Doe_anonymized.zip");
        let expected: BTreeSet<String> = ["a.dcm", "b.dcm", "s1/c.dcm"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(archive_names(&anonymized_zip), expected);

        let scratch = TempDir::new().unwrap();
        for name in &expected {
            let anonymized = extract(&anonymized_zip, name, scratch.path());
            assert_eq!(value(&anonymized, PATIENT_NAME), "");
            let original = extract(&root.join("Jane Doe.zip"), name, scratch.path());
            assert_eq!(value(&original, PATIENT_NAME), "Jane Doe");
        }
    }
}
