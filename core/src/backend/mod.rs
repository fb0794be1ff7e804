//! Interchangeable DICOM backends
//!
//! Both backends implement [`DicomBackend`]: reading catalog values from a
//! representative file and zapping a batch of files into a [`DirectoryPair`].
//! The backend is chosen once by [`select_backend`] and passed to the
//! orchestrator; nothing downstream branches on which one is active.

#[cfg(all(test, feature = "library"))]
pub(crate) mod fixtures;
#[cfg(feature = "library")]
mod library;
mod process;
#[cfg(feature = "library")]
pub mod tags;
mod toolkit;

#[cfg(feature = "library")]
pub use library::LibraryBackend;
pub use process::Tool;
pub use toolkit::{parse_dump_value, ModifyCommand, ToolkitBackend, DCMDUMP, DCMODIFY};

use crate::catalog::FieldCatalog;
use crate::error::{Result, ZapError};
use crate::types::{
    BackendKind, BackendPreference, DirectoryPair, FileRecord, ZapConfig, ZappingPlan,
};
use log::info;
use std::path::{Path, PathBuf};

/// Where each input file ended up after zapping
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ZapReport {
    /// Files written to the original directory
    pub original: Vec<PathBuf>,

    /// Files written to the anonymized directory
    pub anonymized: Vec<PathBuf>,

    /// Inputs whose untouched copy could not be recovered
    pub missing_originals: Vec<PathBuf>,

    /// (field, file) lookups that did not resolve while rewriting
    pub skipped_fields: usize,
}

impl ZapReport {
    /// Appends the outcome of another batch
    pub fn extend(&mut self, other: ZapReport) {
        self.original.extend(other.original);
        self.anonymized.extend(other.anonymized);
        self.missing_originals.extend(other.missing_originals);
        self.skipped_fields += other.skipped_fields;
    }
}

/// Capability set shared by the library and toolkit backends
pub trait DicomBackend {
    /// Which backend this is
    fn kind(&self) -> BackendKind;

    /// Text written for a blanked field
    fn blank_value(&self) -> &'static str;

    /// Fills `value` on every catalog field that resolves on `sample`
    ///
    /// Unresolvable fields are left without value. Returns how many fields
    /// received a value.
    fn read_values(&self, sample: &Path, catalog: &mut FieldCatalog) -> Result<usize>;

    /// Splits `files` into the original and anonymized directories of `pair`,
    /// rewriting the anonymized copies according to `plan`
    ///
    /// Every input leaves its source location. An identity plan sends every
    /// file to the original directory only.
    fn zap(
        &self,
        files: &[FileRecord],
        pair: &DirectoryPair,
        plan: &ZappingPlan,
    ) -> Result<ZapReport>;

    /// Re-applies `plan` to files an interrupted run left in the anonymized
    /// directory of `pair`
    ///
    /// `files` are relative to the anonymized directory. Rewriting a file
    /// that was already zapped leaves it unchanged.
    fn rezap(
        &self,
        files: &[FileRecord],
        pair: &DirectoryPair,
        plan: &ZappingPlan,
    ) -> Result<ZapReport>;
}

/// Returns whether the in-process library backend was compiled in
pub fn library_available() -> bool {
    cfg!(feature = "library")
}

/// Chooses the backend according to the configured preference
///
/// `Auto` prefers the library, then the toolkit if `dcmdump` can be run.
///
/// # Errors
///
/// `BackendUnavailable` if the requested backend (or, for `Auto`, any
/// backend) cannot be used
pub fn select_backend(config: &ZapConfig) -> Result<Box<dyn DicomBackend>> {
    let backend = match config.backend {
        BackendPreference::Auto => library_backend(config)
            .or_else(|| toolkit_backend(config))
            .ok_or_else(|| {
                ZapError::BackendUnavailable(format!(
                    "library support not compiled in and {} not found",
                    DCMDUMP
                ))
            })?,
        BackendPreference::Library => library_backend(config).ok_or_else(|| {
            ZapError::BackendUnavailable("library support not compiled in".to_string())
        })?,
        BackendPreference::Toolkit => toolkit_backend(config).ok_or_else(|| {
            ZapError::BackendUnavailable(format!("{} not found", DCMDUMP))
        })?,
    };

    info!("Using {} backend", backend.kind());
    Ok(backend)
}

#[cfg(feature = "library")]
fn library_backend(_config: &ZapConfig) -> Option<Box<dyn DicomBackend>> {
    Some(Box::new(LibraryBackend::new()))
}

#[cfg(not(feature = "library"))]
fn library_backend(_config: &ZapConfig) -> Option<Box<dyn DicomBackend>> {
    None
}

fn toolkit_backend(config: &ZapConfig) -> Option<Box<dyn DicomBackend>> {
    let backend = ToolkitBackend::from_config(config);
    if backend.is_available() {
        Some(Box::new(backend))
    } else {
        None
    }
}

/// Reads catalog values from the representative file of a folder
///
/// Returns how many fields received a value.
pub fn read_catalog_values(
    backend: &dyn DicomBackend,
    sample: &Path,
    catalog: &mut FieldCatalog,
) -> Result<usize> {
    let resolved = backend.read_values(sample, catalog)?;
    info!(
        "Read {}/{} field values from {}",
        resolved,
        catalog.len(),
        sample.display()
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "library")]
    #[test]
    fn test_auto_prefers_library() {
        let backend = select_backend(&ZapConfig::default()).unwrap();
        assert_eq!(backend.kind(), BackendKind::Library);
    }

    #[cfg(feature = "library")]
    #[test]
    fn test_explicit_library() {
        let config = ZapConfig::default().with_backend(BackendPreference::Library);
        assert_eq!(select_backend(&config).unwrap().kind(), BackendKind::Library);
    }

    #[test]
    fn test_report_extend() {
        let mut report = ZapReport {
            original: vec![PathBuf::from("/study/Jane Doe/a.dcm")],
            anonymized: vec![PathBuf::from("/study/Jane Doe_anonymized/a.dcm")],
            missing_originals: Vec::new(),
            skipped_fields: 1,
        };
        report.extend(ZapReport {
            original: Vec::new(),
            anonymized: vec![PathBuf::from("/study/Jane Doe_anonymized/b.dcm")],
            missing_originals: vec![PathBuf::from("b.dcm")],
            skipped_fields: 2,
        });

        assert_eq!(report.original.len(), 1);
        assert_eq!(report.anonymized.len(), 2);
        assert_eq!(report.missing_originals, vec![PathBuf::from("b.dcm")]);
        assert_eq!(report.skipped_fields, 3);
    }

    #[test]
    fn test_library_flag_matches_feature() {
        assert_eq!(library_available(), cfg!(feature = "library"));
    }
}
