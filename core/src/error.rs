use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for dicomzap operations
pub type Result<T> = std::result::Result<T, ZapError>;

/// Error types for dicomzap operations
///
/// Every variant aborts the run. Fields that fail to resolve on a file are
/// not errors: lookups return `Option` and the miss is only counted.
#[derive(Error, Debug)]
pub enum ZapError {
    /// Neither the in-process library nor the external toolkit is usable
    #[error("No DICOM backend available: {0}")]
    BackendUnavailable(String),

    /// Root folder does not exist or is not a directory
    #[error("The directory {0} does not exist")]
    NotFound(PathBuf),

    /// A walked directory holds neither files nor subdirectories
    #[error("Could not find any files in {0}")]
    EmptyDirectory(PathBuf),

    /// One of the resulting directories is missing after zapping
    #[error("Failed to anonymize data: {0} is missing")]
    AnonymizationFailed(PathBuf),

    /// Refused to archive a directory without entries
    #[error("The directory {0} is empty and will not be archived")]
    EmptyInput(PathBuf),

    /// Archive file not found after writing it
    #[error("{0} could not be created")]
    ArchiveCreation(PathBuf),

    /// Directory layout conflict or unusable directory name
    #[error("Filesystem error: {0}")]
    FileSystem(String),

    /// Malformed field catalog
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Designated identifying field has no value to name the directories with
    #[error("Identifying field {0} has no value")]
    MissingIdentifier(String),

    /// Operator override for an unknown or non-editable field
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// DICOM reading or writing error
    #[error("DICOM error: {0}")]
    Dicom(String),

    /// External tool exited unsuccessfully
    #[error("{program} failed on {path}: {message}")]
    ToolFailed {
        program: String,
        path: PathBuf,
        message: String,
    },

    /// External tool did not finish before its deadline
    #[error("{program} timed out after {timeout:?}")]
    ToolTimeout { program: String, timeout: Duration },

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP writer error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl From<walkdir::Error> for ZapError {
    fn from(e: walkdir::Error) -> Self {
        ZapError::Io(e.into())
    }
}

impl From<quick_xml::DeError> for ZapError {
    fn from(e: quick_xml::DeError) -> Self {
        ZapError::Catalog(format!("{}", e))
    }
}

// Convert dicom-object errors
#[cfg(feature = "library")]
impl From<dicom_object::ReadError> for ZapError {
    fn from(e: dicom_object::ReadError) -> Self {
        ZapError::Dicom(format!("{}", e))
    }
}

#[cfg(feature = "library")]
impl From<dicom_object::WriteError> for ZapError {
    fn from(e: dicom_object::WriteError) -> Self {
        ZapError::Dicom(format!("{}", e))
    }
}
