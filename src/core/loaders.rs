//! Data loaders for instrument text logs and per-session export files.
//!
//! This module provides:
//! - Whole-file reading of the interleaved text log
//! - Discovery of export files in a directory
//! - A delimited-table parser shared by both input paths, which locates the
//!   header row and resolves the configured channel columns once

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use crate::config::SchemaConfig;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("No header row starting with '{0}'")]
    MissingHeader(String),

    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error("Field delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// One row of instrument output, still as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Observation number, remark marker or boot marker
    pub observation: String,
    /// Time of day as written by the instrument
    pub time: String,
    /// Channel values in schema order; empty when the row is short
    pub channels: Vec<String>,
    /// Every non-empty field of the row, in column order
    pub fields: Vec<String>,
}

impl RawRecord {
    fn from_record(record: &StringRecord, columns: &ColumnIndex) -> Self {
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();

        Self {
            observation: field(columns.observation),
            time: field(columns.time),
            channels: columns.channels.iter().map(|&i| field(i)).collect(),
            fields: record
                .iter()
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// One session's parsed rows.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Channel names, in the order of each record's `channels`
    pub channels: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Resolved positions of the schema columns within a header.
#[derive(Debug)]
struct ColumnIndex {
    observation: usize,
    time: usize,
    channels: Vec<usize>,
}

impl ColumnIndex {
    fn resolve(header: &StringRecord, schema: &SchemaConfig) -> Result<Self> {
        let position = |name: &str| header.iter().position(|h| h == name);

        let mut missing = Vec::new();
        let mut lookup = |name: &str| {
            let idx = position(name);
            if idx.is_none() {
                missing.push(name.to_string());
            }
            idx.unwrap_or(0)
        };

        let observation = lookup(schema.observation_column.as_str());
        let time = lookup(schema.time_column.as_str());
        let channels: Vec<usize> = schema.channels.iter().map(|c| lookup(c.as_str())).collect();

        if !missing.is_empty() {
            return Err(LoaderError::MissingColumns(missing.join(", ")));
        }

        Ok(Self {
            observation,
            time,
            channels,
        })
    }
}

/// Convert a configured delimiter to the single byte the CSV reader splits on.
///
/// # Errors
///
/// Returns [`LoaderError::InvalidDelimiter`] for anything outside ASCII.
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(LoaderError::InvalidDelimiter(delimiter))
    }
}

/// Parse delimited text into a [`RawTable`].
///
/// Rows above the header (the first row whose first field equals the
/// configured observation column) are treated as instrument preamble and
/// skipped. Blank rows are ignored. Records may be shorter or longer than
/// the header; remark rows usually are.
///
/// # Errors
///
/// Returns an error if the delimiter is not ASCII, if no header row is
/// found, if any configured column is absent from it, or if the text is not
/// valid delimited data.
pub fn parse_table(body: &str, delimiter: char, schema: &SchemaConfig) -> Result<RawTable> {
    let delimiter = delimiter_byte(delimiter)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_reader(body.as_bytes());

    let mut columns: Option<ColumnIndex> = None;
    let mut records = Vec::new();

    for result in reader.records() {
        let record = result?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        if let Some(index) = &columns {
            records.push(RawRecord::from_record(&record, index));
        } else if record.get(0) == Some(schema.observation_column.as_str()) {
            columns = Some(ColumnIndex::resolve(&record, schema)?);
        }
    }

    if columns.is_none() {
        return Err(LoaderError::MissingHeader(schema.observation_column.clone()));
    }

    Ok(RawTable {
        channels: schema.channels.clone(),
        records,
    })
}

/// Read an entire text log into memory.
///
/// The instrument writes Latin-1 in places (degree signs, micro signs), so
/// invalid UTF-8 is replaced rather than rejected.
pub fn read_text_log<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LoaderError::FileNotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// List export files in `directory` whose extension is in `extensions`.
///
/// Returned paths are sorted by name, which is the session order used for
/// concatenation.
pub fn list_export_files(directory: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(LoaderError::DirectoryNotFound(directory.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(directory)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
                    .unwrap_or(false)
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Load one export file as a single session.
pub fn load_export_file(path: &Path, delimiter: char, schema: &SchemaConfig) -> Result<RawTable> {
    let content = read_text_log(path)?;
    parse_table(&content, delimiter, schema)
}
