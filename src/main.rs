//! Command-line interface for facturx

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use facturx::{FacturXDocument, FacturXError};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "facturx")]
#[command(author, version, about = "Factur-X / ZUGFeRD invoice PDF tool", long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export the embedded invoice as JSON, YAML or XML
    Dump {
        /// Factur-X or ZUGFeRD PDF
        #[arg(value_name = "PDF")]
        pdf: PathBuf,

        /// Output file; the extension (.json, .yml, .xml) selects the format
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Check that the embedded invoice is valid
    Validate {
        /// Factur-X or ZUGFeRD PDF
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Dump { pdf, output } => cmd_dump(pdf, output),
        Commands::Validate { pdf } => cmd_validate(pdf),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("facturx=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("facturx=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_dump(pdf: PathBuf, output: PathBuf) -> Result<ExitCode, FacturXError> {
    let mut doc = FacturXDocument::open(pdf)?;
    doc.export(&output)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(pdf: PathBuf) -> Result<ExitCode, FacturXError> {
    let opened = FacturXDocument::open(pdf);
    let outcome = opened.and_then(|mut doc| doc.validate().map(|_| ()));
    match outcome {
        Ok(()) => {
            println!("valid");
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ (FacturXError::InputType(_) | FacturXError::Io(_) | FacturXError::Pdf(_))) => {
            Err(e)
        }
        Err(e) => {
            println!("invalid: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
