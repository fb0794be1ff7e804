pub mod api;
pub mod backend;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod files;
pub mod types;

pub use api::{Anonymizer, RunSummary};
pub use backend::{select_backend, DicomBackend, ToolkitBackend, ZapReport};
pub use catalog::FieldCatalog;
pub use cli::report::TextReport;
pub use error::{Result, ZapError};
pub use types::*;
