use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::roster::{self, IngestError};

#[derive(Debug, Parser)]
#[command(name = "campaign-console", version, about = "Certificate campaign console")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run migrations, start the trigger worker and serve HTTP (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Validate a roster CSV locally without touching the database
    CheckCsv {
        /// Path to the CSV file
        path: PathBuf,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CheckCsvError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("{0}")]
    Rejected(#[from] IngestError),
}

/// Ingest a local roster and summarize the outcome
pub fn check_csv(path: &Path) -> Result<String, CheckCsvError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CheckCsvError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let records = roster::ingest(&raw)?;
    Ok(format!(
        "Successfully parsed {} email records from {}",
        records.len(),
        path.display()
    ))
}
