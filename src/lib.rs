//! Tidy remark-annotated logs from a portable photosynthesis system.
//!
//! The instrument interleaves operator remarks with its sensor readings.
//! This crate provides tools for:
//! - Splitting an appended text log into per-session tables
//! - Classifying rows as readings, remarks or warm-up noise
//! - Extracting plot/plant/leaf labels from remarks with a configurable grammar
//! - Filling those labels forward onto the readings they describe
//! - Assembling every session into one typed, labelled table
//!
//! # Example
//!
//! ```no_run
//! use gasex_tidy::{core::writers::write_tidy_csv, processors::process_text_log, PipelineConfig};
//! use std::path::Path;
//!
//! let config = PipelineConfig::default();
//! let (table, _summary) = process_text_log(Path::new("field.log"), &config).unwrap();
//! write_tidy_csv(Path::new("tidy.csv"), &table).unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use config::{IdentifierConfig, PipelineConfig, SchemaConfig, SpreadsheetConfig, TextLogConfig};
pub use processors::{RunSummary, SampleIdentifier, TidyTable};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
