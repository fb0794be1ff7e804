use crate::api::RunSummary;
use std::fmt;
use std::path::Path;

/// Text report formatter for a run summary
pub struct TextReport<'a> {
    summary: &'a RunSummary,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(summary: &'a RunSummary) -> Self {
        Self { summary }
    }
}

fn display_or_none(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.summary;

        writeln!(f, "DICOM Anonymization")?;
        writeln!(f, "===================")?;
        writeln!(f)?;
        writeln!(f, "Folder:         {}", summary.root.display())?;
        writeln!(f, "Identifier:     {}", summary.identifier)?;
        writeln!(f, "Backend:        {}", summary.backend)?;
        writeln!(f, "Sample File:    {}", summary.representative.display())?;
        writeln!(f, "Values Read:    {}", summary.values_read)?;
        writeln!(f, "Files:          {}", summary.files)?;
        writeln!(f, "Zapped Fields:  {}", summary.changed_fields)?;
        writeln!(f)?;

        writeln!(f, "Plan")?;
        writeln!(f, "----")?;
        for edit in summary.plan.edits() {
            writeln!(f, "({}) {:<28} {}", edit.key, edit.description, edit.action)?;
        }
        writeln!(f)?;

        if summary.dry_run {
            writeln!(f, "Dry run: no file was modified")?;
            return Ok(());
        }

        writeln!(f, "Result")?;
        writeln!(f, "------")?;
        writeln!(f, "Original Files:   {}", summary.report.original.len())?;
        writeln!(f, "Anonymized Files: {}", summary.report.anonymized.len())?;
        writeln!(f, "Skipped Lookups:  {}", summary.report.skipped_fields)?;
        writeln!(
            f,
            "Original Archive: {}",
            display_or_none(summary.original_archive.as_deref())
        )?;
        writeln!(
            f,
            "Anonymized Archive: {}",
            display_or_none(summary.anonymized_archive.as_deref())
        )?;
        writeln!(f, "Removed Directories: {}", summary.removed_directories)?;

        if !summary.report.missing_originals.is_empty() {
            writeln!(f)?;
            writeln!(f, "Missing Originals")?;
            writeln!(f, "-----------------")?;
            for path in &summary.report.missing_originals {
                writeln!(f, "{}", path.display())?;
            }
        }

        Ok(())
    }
}
