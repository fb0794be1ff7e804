use super::process::Tool;
use super::{DicomBackend, ZapReport};
use crate::catalog::FieldCatalog;
use crate::error::{Result, ZapError};
use crate::files::{copy_file, move_file};
use crate::types::{
    BackendKind, DirectoryPair, FileRecord, Preservation, ZapConfig, ZappingPlan,
    DEFAULT_TOOL_TIMEOUT,
};
use log::{debug, error, info, warn};
use regex::Regex;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Header dump executable of the DICOM toolkit
pub const DCMDUMP: &str = "dcmdump";

/// Header rewrite executable of the DICOM toolkit
pub const DCMODIFY: &str = "dcmodify";

/// Suffix of the backup `dcmodify` leaves next to a rewritten file
pub const BACKUP_SUFFIX: &str = ".bak";

// dcmodify has always been fed a single space for blanked fields
const TOOLKIT_BLANK: &str = " ";

/// Extracts the bracketed value from a `dcmdump` line
///
/// `(0010,0010) PN [Jane Doe]   #   8, 1 PatientName` yields `Jane Doe`.
/// Output without a bracketed value (absent element, empty value) yields `None`.
pub fn parse_dump_value(output: &str) -> Option<String> {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| Regex::new(r".*\[(.+)\].*").expect("Failed to compile regex"));

    re.captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// One `dcmodify` argument list covering every touched field
///
/// Built once per batch, in catalog order, and applied to each file by
/// appending its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyCommand {
    args: Vec<String>,
    edits: usize,
}

impl ModifyCommand {
    /// Builds the directives for `plan`
    ///
    /// With `Preservation::Copy` the tool is told not to write a backup.
    pub fn from_plan(plan: &ZappingPlan, preservation: Preservation) -> Self {
        let mut args = Vec::new();
        if preservation == Preservation::Copy {
            args.push("-nb".to_string());
        }

        let mut edits = 0;
        for edit in plan.touched() {
            if let Some(value) = edit.action.new_value(TOOLKIT_BLANK) {
                args.push("-ma".to_string());
                args.push(format!("{}={}", edit.key.to_toolkit_path(), value));
                edits += 1;
            }
        }

        Self { args, edits }
    }

    /// Arguments preceding the file path
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Number of field directives
    pub fn edit_count(&self) -> usize {
        self.edits
    }

    fn args_for(&self, path: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(OsString::from)
            .chain(std::iter::once(path.as_os_str().to_owned()))
            .collect()
    }
}

/// Backend driving the `dcmdump` / `dcmodify` command-line tools
#[derive(Debug, Clone)]
pub struct ToolkitBackend {
    dump: Tool,
    modify: Tool,
    preservation: Preservation,
    timeout: Duration,
}

impl Default for ToolkitBackend {
    fn default() -> Self {
        Self {
            dump: Tool::new(DCMDUMP),
            modify: Tool::new(DCMODIFY),
            preservation: Preservation::Copy,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

impl ToolkitBackend {
    /// Creates a backend using the toolkit found on `PATH`
    pub fn from_config(config: &ZapConfig) -> Self {
        Self::default()
            .with_preservation(config.preservation)
            .with_timeout(config.tool_timeout)
    }

    /// Replaces the dump and modify programs
    pub fn with_tools(mut self, dump: Tool, modify: Tool) -> Self {
        self.dump = dump;
        self.modify = modify;
        self
    }

    /// Sets the original-preservation strategy
    pub fn with_preservation(mut self, preservation: Preservation) -> Self {
        self.preservation = preservation;
        self
    }

    /// Sets the per-invocation deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns whether the dump tool can be started
    pub fn is_available(&self) -> bool {
        self.dump.probe()
    }

    fn dump_value(&self, key: &str, sample: &Path) -> Result<Option<String>> {
        let args: [&OsStr; 5] = [
            OsStr::new("-ml"),
            OsStr::new("+P"),
            OsStr::new(key),
            OsStr::new("-q"),
            sample.as_os_str(),
        ];
        let output = self.dump.run(args, self.timeout)?;
        if !output.status.success() {
            debug!(
                "{} exited with {} for {}: {}",
                self.dump.name(),
                output.status,
                key,
                output.stderr.trim()
            );
            return Ok(None);
        }
        Ok(parse_dump_value(&output.stdout))
    }

    fn run_modify(&self, command: &ModifyCommand, target: &Path) -> Result<()> {
        let output = self.modify.run(command.args_for(target), self.timeout)?;
        if !output.status.success() {
            return Err(ZapError::ToolFailed {
                program: self.modify.name(),
                path: target.to_path_buf(),
                message: format!("{}: {}", output.status, output.stderr.trim()),
            });
        }
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Path of the file a `.bak` was made from, `None` for any other path
fn backup_source(path: &Path) -> Option<PathBuf> {
    path.to_str()?
        .strip_suffix(BACKUP_SUFFIX)
        .filter(|source| !source.is_empty())
        .map(PathBuf::from)
}

impl DicomBackend for ToolkitBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Toolkit
    }

    fn blank_value(&self) -> &'static str {
        TOOLKIT_BLANK
    }

    fn read_values(&self, sample: &Path, catalog: &mut FieldCatalog) -> Result<usize> {
        let mut resolved = 0;
        for field in catalog.fields_mut() {
            match self.dump_value(&field.key.to_string(), sample)? {
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
        let command = ModifyCommand::from_plan(plan, self.preservation);
        let mut report = ZapReport::default();

        if command.edit_count() == 0 {
            info!("No field to modify, moving files to original directory only");
        }

        for file in files {
            let original = pair.original_path(file);
            let anonymized = pair.anonymized_path(file);

            if command.edit_count() == 0 {
                move_file(&file.path, &original)?;
                report.original.push(original);
                continue;
            }

            match self.preservation {
                Preservation::Copy => {
                    copy_file(&file.path, &original)?;
                    report.original.push(original);
                    move_file(&file.path, &anonymized)?;
                    self.run_modify(&command, &anonymized)?;

                    let backup = backup_path(&anonymized);
                    if backup.exists() {
                        fs::remove_file(&backup)?;
                    }
                }
                Preservation::Backup => {
                    move_file(&file.path, &anonymized)?;
                    self.run_modify(&command, &anonymized)?;

                    let backup = backup_path(&anonymized);
                    if backup.exists() {
                        move_file(&backup, &original)?;
                        report.original.push(original);
                    } else {
                        error!(
                            "{} left no backup of {}, original copy is missing",
                            self.modify.name(),
                            file.relative.display()
                        );
                        report.missing_originals.push(file.relative.clone());
                    }
                }
            }
            report.anonymized.push(anonymized);
        }

        Ok(report)
    }

    fn rezap(
        &self,
        files: &[FileRecord],
        pair: &DirectoryPair,
        plan: &ZappingPlan,
    ) -> Result<ZapReport> {
        // Staged files are rewritten in place without a new backup
        let command = ModifyCommand::from_plan(plan, Preservation::Copy);
        let mut report = ZapReport::default();

        for file in files {
            let anonymized = pair.anonymized_path(file);

            if let Some(source) = backup_source(&file.relative) {
                let original = pair.original.join(source);
                move_file(&anonymized, &original)?;
                report.original.push(original);
                continue;
            }

            let original = pair.original_path(file);
            if !original.exists() && !backup_path(&anonymized).exists() {
                warn!(
                    "No original copy of {}, keeping the staged file before rewriting it",
                    file.relative.display()
                );
                copy_file(&anonymized, &original)?;
                report.original.push(original);
            }

            if command.edit_count() > 0 {
                self.run_modify(&command, &anonymized)?;
            }
            report.anonymized.push(anonymized);
        }

        Ok(report)
    }
}
