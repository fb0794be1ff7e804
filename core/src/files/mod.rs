//! Filesystem side of a run
//!
//! Walks the root folder, creates the mirrored directory pair, relocates
//! files between them and packages each directory into a ZIP archive.

mod archive;
mod discovery;
mod layout;

pub use archive::{ensure_non_empty, zip_directory};
pub use discovery::{discover, is_dicom_file, list_files, Discovery};
pub use layout::{
    copy_file, create_directories, move_file, remove_skeletons, validate_identifier,
};
