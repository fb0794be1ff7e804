use clap::Parser;
use dicomzap_core::cli::{Cli, OutputFormat};
use dicomzap_core::{select_backend, Anonymizer, FieldCatalog, RunSummary, TextReport, ZapError};
use log::{error, info};
use std::process;

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(summary) => output_summary(&summary, &cli.format),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<RunSummary, ZapError> {
    let config = cli.to_config();

    let mut catalog = match &cli.catalog {
        Some(path) => {
            info!("Loading field catalog from {}", path.display());
            FieldCatalog::from_file(path)?
        }
        None => FieldCatalog::default_catalog()?,
    };

    let backend = select_backend(&config)?;

    info!("Processing directory: {}", cli.folder.display());
    Anonymizer::new(&config, backend.as_ref()).run(&cli.folder, &mut catalog, &cli.update)
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn output_summary(summary: &RunSummary, format: &OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("{}", TextReport::new(summary));
        }
        OutputFormat::Json => {
            #[cfg(feature = "json")]
            {
                match serde_json::to_string_pretty(summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to serialize to JSON: {}", e);
                        eprintln!("Error: Failed to serialize to JSON: {}", e);
                        process::exit(1);
                    }
                }
            }
            #[cfg(not(feature = "json"))]
            {
                let _ = summary;
                eprintln!("Error: JSON output requires the 'json' feature");
                eprintln!("Rebuild with: cargo build --features json");
                process::exit(1);
            }
        }
    }
}
