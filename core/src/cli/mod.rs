pub mod report;

use crate::types::{BackendPreference, FieldKey, Preservation, ZapConfig};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for dicomzap
#[derive(Parser, Debug)]
#[command(name = "dicomzap")]
#[command(about = "Split a DICOM folder into original and anonymized archives")]
#[command(version)]
pub struct Cli {
    /// Folder containing the DICOM files
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// XML field catalog (defaults to the built-in catalog)
    #[arg(short, long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Backend used to read and rewrite files
    #[arg(short, long, default_value = "auto")]
    pub backend: BackendArg,

    /// Overwrite an editable field, e.g. `--update 0010,1010=050Y`
    #[arg(short, long, value_name = "KEY=VALUE", value_parser = parse_update)]
    pub update: Vec<(FieldKey, String)>,

    /// Field whose value names the output directories
    #[arg(long, value_name = "KEY", default_value = "0010,0010", value_parser = parse_key)]
    pub identifier: FieldKey,

    /// How the toolkit backend keeps the untouched copy
    #[arg(long, default_value = "copy")]
    pub preserve: PreserveArg,

    /// Seconds before an external tool invocation is killed
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub tool_timeout: u64,

    /// Continue an interrupted run, reusing the existing directories
    #[arg(long)]
    pub resume: bool,

    /// Print the zapping plan without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the run configuration from the parsed arguments
    pub fn to_config(&self) -> ZapConfig {
        ZapConfig::default()
            .with_backend(self.backend.clone().into())
            .with_identifying_field(self.identifier)
            .with_preservation(self.preserve.clone().into())
            .with_tool_timeout(Duration::from_secs(self.tool_timeout))
            .resume(self.resume)
            .dry_run(self.dry_run)
    }
}

/// Backend options
#[derive(Debug, Clone, ValueEnum)]
pub enum BackendArg {
    /// Library if available, otherwise the DICOM toolkit
    Auto,
    /// In-process DICOM library
    Library,
    /// dcmdump / dcmodify from the DICOM toolkit
    Toolkit,
}

impl From<BackendArg> for BackendPreference {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => BackendPreference::Auto,
            BackendArg::Library => BackendPreference::Library,
            BackendArg::Toolkit => BackendPreference::Toolkit,
        }
    }
}

/// Original-preservation options
#[derive(Debug, Clone, ValueEnum)]
pub enum PreserveArg {
    /// Copy each file before rewriting it
    Copy,
    /// Keep the .bak file written by dcmodify
    Backup,
}

impl From<PreserveArg> for Preservation {
    fn from(arg: PreserveArg) -> Self {
        match arg {
            PreserveArg::Copy => Preservation::Copy,
            PreserveArg::Backup => Preservation::Backup,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

fn parse_key(s: &str) -> Result<FieldKey, String> {
    s.parse()
}

fn parse_update(s: &str) -> Result<(FieldKey, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    Ok((key.parse()?, value.to_string()))
}
