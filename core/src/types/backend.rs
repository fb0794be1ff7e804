use std::fmt;

/// Concrete mechanism used to read and rewrite DICOM files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum BackendKind {
    /// In-process DICOM library
    Library,
    /// External DICOM toolkit (`dcmdump` / `dcmodify`)
    Toolkit,
}

impl BackendKind {
    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            BackendKind::Library => "library",
            BackendKind::Toolkit => "toolkit",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Which backend the operator asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendPreference {
    /// Library if compiled in, otherwise the toolkit if installed
    #[default]
    Auto,
    Library,
    Toolkit,
}

/// How the toolkit backend keeps an untouched copy of each file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preservation {
    /// Copy the file into the original directory before rewriting it
    #[default]
    Copy,
    /// Rely on the `.bak` file written by `dcmodify` next to its target
    Backup,
}
