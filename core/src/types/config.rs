use crate::types::backend::{BackendPreference, Preservation};
use crate::types::field::FieldKey;
use std::time::Duration;

/// Extensions never treated as DICOM data (compared case-insensitively)
pub const DEFAULT_DENIED_EXTENSIONS: [&str; 7] = ["bmp", "png", "zip", "txt", "jpeg", "jpg", "pdf"];

/// File names never treated as DICOM data
pub const DEFAULT_DENIED_NAMES: [&str; 1] = [".DS_Store"];

/// Suffix distinguishing the anonymized directory from the original one
pub const ANONYMIZED_SUFFIX: &str = "_anonymized";

/// Patient name, the default identifying field
pub const DEFAULT_IDENTIFYING_FIELD: FieldKey = FieldKey::new(0x0010, 0x0010);

/// Default deadline for one external tool invocation
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Run configuration, established once at startup and passed by reference
///
/// # Example
///
/// ```
/// use dicomzap_core::{BackendPreference, Preservation, ZapConfig};
/// use std::time::Duration;
///
/// let config = ZapConfig::default()
///     .with_backend(BackendPreference::Toolkit)
///     .with_preservation(Preservation::Backup)
///     .with_tool_timeout(Duration::from_secs(5))
///     .resume(true);
///
/// assert!(config.resume);
/// assert!(!config.dry_run);
/// assert_eq!(config.anonymized_suffix, "_anonymized");
/// assert!(config.is_denied("scan.PNG"));
/// assert!(!config.is_denied("scan.dcm"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ZapConfig {
    /// Requested backend
    pub backend: BackendPreference,

    /// Field whose value names the directory pair
    pub identifying_field: FieldKey,

    /// Extensions skipped during discovery
    pub denied_extensions: Vec<String>,

    /// File names skipped during discovery
    pub denied_names: Vec<String>,

    /// Suffix of the anonymized directory
    pub anonymized_suffix: String,

    /// Original-preservation strategy of the toolkit backend
    pub preservation: Preservation,

    /// Deadline for each external tool invocation
    pub tool_timeout: Duration,

    /// Continue a previously interrupted run
    pub resume: bool,

    /// Compute the plan without touching the filesystem
    pub dry_run: bool,
}

impl Default for ZapConfig {
    fn default() -> Self {
        Self {
            backend: BackendPreference::Auto,
            identifying_field: DEFAULT_IDENTIFYING_FIELD,
            denied_extensions: DEFAULT_DENIED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            denied_names: DEFAULT_DENIED_NAMES.iter().map(|s| s.to_string()).collect(),
            anonymized_suffix: ANONYMIZED_SUFFIX.to_string(),
            preservation: Preservation::Copy,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            resume: false,
            dry_run: false,
        }
    }
}

impl ZapConfig {
    /// Sets the requested backend
    pub fn with_backend(mut self, backend: BackendPreference) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the identifying field
    pub fn with_identifying_field(mut self, key: FieldKey) -> Self {
        self.identifying_field = key;
        self
    }

    /// Replaces the denied extension list
    pub fn with_denied_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denied_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the toolkit preservation strategy
    pub fn with_preservation(mut self, preservation: Preservation) -> Self {
        self.preservation = preservation;
        self
    }

    /// Sets the external tool deadline
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Enables or disables resume mode
    pub fn resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Enables or disables dry-run mode
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns whether a file name is excluded from discovery
    pub fn is_denied(&self, file_name: &str) -> bool {
        if self.denied_names.iter().any(|name| name == file_name) {
            return true;
        }
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self
                .denied_extensions
                .iter()
                .any(|denied| denied.eq_ignore_ascii_case(ext)),
            _ => false,
        }
    }
}
