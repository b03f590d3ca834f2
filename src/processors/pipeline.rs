//! End-to-end processing for both input paths.
//!
//! ```text
//!  text log ──► segmenter ──► parse_table ─┐
//!                                          ├─► merge_session ──► Assembler ──► TidyTable
//!  export dir ──► load_export_file ────────┘
//! ```

use std::path::Path;

use log::{debug, info, warn};
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::core::loaders::{self, LoaderError, RawTable};

use super::assembler::{Assembler, TidyTable};
use super::fill_forward::{merge_session, MergeStats};
use super::identifier::{ExtractIdentifier, GrammarError, IdentifierGrammar};
use super::segmenter::split_sessions;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sessions_seen: usize,
    /// Sessions that could not be parsed as a table
    pub sessions_dropped: usize,
    pub rows: MergeStats,
    pub coercion_failures: usize,
}

/// Merge and assemble a sequence of parsed sessions.
///
/// Sessions that failed to parse are logged and skipped. Everything is
/// appended in iteration order.
pub fn assemble_sessions<I, E>(sessions: I, extractor: &E, config: &PipelineConfig) -> (TidyTable, RunSummary)
where
    I: IntoIterator<Item = (String, std::result::Result<RawTable, LoaderError>)>,
    E: ExtractIdentifier + ?Sized,
{
    let mut summary = RunSummary::default();
    let mut assembler = Assembler::new(config.schema.channels.clone(), config.output.date);

    for (label, parsed) in sessions {
        summary.sessions_seen += 1;

        let table = match parsed {
            Ok(table) => table,
            Err(e) => {
                warn!("{}: dropped, not a valid table: {}", label, e);
                summary.sessions_dropped += 1;
                continue;
            }
        };

        let (rows, stats) = merge_session(&table, extractor, &config.schema.boot_marker);
        debug!(
            "{}: {} rows, {} remarks, {} identifiers, {} unlabelled, {} retained",
            label,
            table.len(),
            stats.remark_rows,
            stats.identifiers_found,
            stats.unlabelled_rows,
            stats.retained_rows
        );

        summary.rows.absorb(&stats);
        assembler.push_session(&label, rows);
    }

    summary.coercion_failures = assembler.coercion_failures();
    (assembler.finish(), summary)
}

/// Tidy an in-memory text log with the given extractor.
pub fn tidy_text_log<E>(text: &str, extractor: &E, config: &PipelineConfig) -> (TidyTable, RunSummary)
where
    E: ExtractIdentifier + ?Sized,
{
    let log_config = &config.text_log;
    let sessions = split_sessions(text, &log_config.start_marker, &log_config.end_marker)
        .enumerate()
        .map(|(i, body)| {
            (
                format!("session {}", i + 1),
                loaders::parse_table(body, log_config.delimiter, &config.schema),
            )
        });

    assemble_sessions(sessions, extractor, config)
}

/// Process an interleaved text log file.
///
/// # Errors
///
/// Fails if the log cannot be read, the configured delimiter is not ASCII or
/// the identifier grammar is invalid. Malformed sessions are dropped, not
/// reported as errors.
pub fn process_text_log(path: &Path, config: &PipelineConfig) -> Result<(TidyTable, RunSummary)> {
    loaders::delimiter_byte(config.text_log.delimiter)?;
    let grammar = IdentifierGrammar::from_config(&config.text_log.identifier)?;
    let text = loaders::read_text_log(path)?;
    info!("Read {} bytes from {}", text.len(), path.display());

    Ok(tidy_text_log(&text, &grammar, config))
}

/// Process a directory of per-session export files.
///
/// This path is best-effort: its identifier grammar differs from the text
/// log's and has not been checked against every export variant.
///
/// # Errors
///
/// Fails if the directory does not exist, the delimiter is not ASCII or the
/// grammar is invalid.
pub fn process_spreadsheets(directory: &Path, config: &PipelineConfig) -> Result<(TidyTable, RunSummary)> {
    warn!("Spreadsheet exports are processed best-effort; check labels against the text log where possible");

    let sheet = &config.spreadsheet;
    loaders::delimiter_byte(sheet.delimiter)?;
    let grammar = IdentifierGrammar::from_config(&sheet.identifier)?;
    let files = loaders::list_export_files(directory, &sheet.extensions)?;
    info!("Found {} export files in {}", files.len(), directory.display());

    let sessions = files.into_iter().map(|path| {
        let label = path.display().to_string();
        let parsed = loaders::load_export_file(&path, sheet.delimiter, &config.schema);
        (label, parsed)
    });

    Ok(assemble_sessions(sessions, &grammar, config))
}
