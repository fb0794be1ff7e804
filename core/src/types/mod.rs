//! Core type definitions for DICOM folder anonymization
//!
//! This module provides the fundamental types used throughout the dicomzap library:
//! - [`Field`] / [`FieldKey`]: A catalog header field and its attribute key
//! - [`FieldAction`] / [`ZappingPlan`]: Per-field zapping decisions
//! - [`FileRecord`] / [`DirectoryPair`]: Discovered files and the output directories
//! - [`BackendKind`] / [`BackendPreference`] / [`Preservation`]: Backend selection
//! - [`ZapConfig`]: Run configuration

mod backend;
mod config;
mod field;
mod layout;
mod plan;

pub use backend::{BackendKind, BackendPreference, Preservation};
pub use config::{
    ZapConfig, ANONYMIZED_SUFFIX, DEFAULT_DENIED_EXTENSIONS, DEFAULT_DENIED_NAMES,
    DEFAULT_IDENTIFYING_FIELD, DEFAULT_TOOL_TIMEOUT,
};
pub use field::{Field, FieldKey};
pub use layout::{archive_path, DirectoryPair, FileRecord};
pub use plan::{FieldAction, PlannedEdit, ZappingPlan};
