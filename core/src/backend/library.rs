use super::tags::{get_value_by_keyword, resolve_keyword};
use super::{DicomBackend, ZapReport};
use crate::catalog::FieldCatalog;
use crate::error::Result;
use crate::files::{copy_file, move_file};
use crate::types::{BackendKind, DirectoryPair, FileRecord, PlannedEdit, ZappingPlan};
use dicom_core::{DataElement, PrimitiveValue};
use dicom_object::open_file;
use log::{debug, info};
use std::path::Path;

const LIBRARY_BLANK: &str = "";

/// Backend reading and rewriting files in-process with `dicom-object`
///
/// Elements are looked up by the catalog description, a standard DICOM
/// keyword such as `PatientName`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryBackend;

impl LibraryBackend {
    /// Creates the backend
    pub fn new() -> Self {
        Self
    }

    /// Applies `edits` to the file at `path` and saves it in place
    ///
    /// Returns the number of edits whose element is absent from the file.
    fn rewrite(&self, path: &Path, edits: &[(&PlannedEdit, &str)]) -> Result<usize> {
        let mut obj = open_file(path)?;
        let mut skipped = 0;

        for (edit, value) in edits {
            let target = resolve_keyword(&edit.description)
                .and_then(|tag| obj.element(tag).ok().map(|elem| (tag, elem.vr())));

            match target {
                Some((tag, vr)) => {
                    obj.put(DataElement::new(tag, vr, PrimitiveValue::from(*value)));
                }
                None => {
                    debug!("{} not found in {}", edit.description, path.display());
                    skipped += 1;
                }
            }
        }

        obj.write_to_file(path)?;
        Ok(skipped)
    }
}

impl DicomBackend for LibraryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Library
    }

    fn blank_value(&self) -> &'static str {
        LIBRARY_BLANK
    }

    fn read_values(&self, sample: &Path, catalog: &mut FieldCatalog) -> Result<usize> {
        let obj = open_file(sample)?;

        let mut resolved = 0;
        for field in catalog.fields_mut() {
            match get_value_by_keyword(&obj, &field.description) {
                Some(value) => {
                    debug!("{} ({}) = {}", field.key, field.description, value);
                    field.value = Some(value);
                    resolved += 1;
                }
                None => debug!("{} ({}) not found", field.key, field.description),
            }
        }
        Ok(resolved)
    }

    fn zap(
        &self,
        files: &[FileRecord],
        pair: &DirectoryPair,
        plan: &ZappingPlan,
    ) -> Result<ZapReport> {
        let mut report = ZapReport::default();

        if plan.is_identity() {
            info!("No field to modify, moving files to original directory only");
            for file in files {
                let original = pair.original_path(file);
                move_file(&file.path, &original)?;
                report.original.push(original);
            }
            return Ok(report);
        }

        // Copy first so a durable copy exists before the source is moved away
        for file in files {
            let original = pair.original_path(file);
            let anonymized = pair.anonymized_path(file);
            copy_file(&file.path, &anonymized)?;
            move_file(&file.path, &original)?;
            report.original.push(original);
            report.anonymized.push(anonymized);
        }

        let edits = planned_values(plan, self.blank_value());
        for path in &report.anonymized {
            report.skipped_fields += self.rewrite(path, &edits)?;
        }

        Ok(report)
    }

    fn rezap(
        &self,
        files: &[FileRecord],
        pair: &DirectoryPair,
        plan: &ZappingPlan,
    ) -> Result<ZapReport> {
        let edits = planned_values(plan, self.blank_value());
        let mut report = ZapReport::default();

        for file in files {
            let anonymized = pair.anonymized_path(file);
            report.skipped_fields += self.rewrite(&anonymized, &edits)?;
            report.anonymized.push(anonymized);
        }

        Ok(report)
    }
}

fn planned_values<'a>(
    plan: &'a ZappingPlan,
    blank: &'a str,
) -> Vec<(&'a PlannedEdit, &'a str)> {
    plan.touched()
        .filter_map(|edit| edit.action.new_value(blank).map(|value| (edit, value)))
        .collect()
}
