//! Delimited-text writer for the tidy table.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use thiserror::Error;

use crate::processors::assembler::TidyTable;

/// Timestamp layout used in the output.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identifier and index columns written ahead of the channels.
const LEADING_COLUMNS: [&str; 5] = ["plot", "plant", "leaf", "obs", "timestamp"];

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to flush data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Write the tidy table as comma-separated text.
///
/// Columns are `plot, plant, leaf, obs, timestamp` followed by every channel
/// in table order. Missing values are written as empty cells.
///
/// # Errors
///
/// Returns an error if the parent directory or file cannot be created, or
/// if writing fails.
pub fn write_tidy_csv(path: &Path, table: &TidyTable) -> Result<()> {
    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut csv_writer = csv::Writer::from_writer(BufWriter::new(file));

    let path_str = path.display().to_string();
    let csv_err = |e: csv::Error| WriteError::CsvError {
        path: path_str.clone(),
        source: e,
    };

    let header = LEADING_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(table.channels.iter().cloned());
    csv_writer.write_record(header).map_err(csv_err)?;

    for record in &table.records {
        let timestamp = record
            .timestamp
            .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default();

        let mut fields = vec![
            record.plot.clone(),
            record.plant.clone(),
            record.leaf.clone(),
            record.observation.to_string(),
            timestamp,
        ];
        fields.extend(
            record
                .values
                .iter()
                .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
        );

        csv_writer.write_record(&fields).map_err(csv_err)?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str.clone(),
        source: e,
    })?;

    Ok(())
}
