//! Configuration types for the tidy pipeline.
//!
//! Everything an operator adjusts per deployment lives here: where the
//! exports are, which columns the instrument writes, the session markers,
//! and the grammar used to read sample labels out of remarks.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or writing a config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// How a matched identifier substring splits into plot, plant and leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decomposition {
    /// `<plot><plant><delim><leaf>`, e.g. `a1 x`.
    Compact,
    /// `<plot><delim><plant><delim><leaf>`, e.g. `h.9.a`.
    Separated,
}

/// Grammar for sample labels written into remarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierConfig {
    /// Regular expression locating the identifier inside the remark text
    pub pattern: String,

    /// Delimiter between identifier parts
    #[serde(default = "default_identifier_delimiter")]
    pub delimiter: String,

    /// Decomposition rule applied to the matched substring
    #[serde(default = "default_decomposition")]
    pub decomposition: Decomposition,
}

fn default_identifier_delimiter() -> String {
    " ".to_string()
}

fn default_decomposition() -> Decomposition {
    Decomposition::Compact
}

impl IdentifierConfig {
    /// Text-log labels: lowercase plot letter, plant digits, a space, leaf token.
    pub fn text_log_default() -> Self {
        Self {
            pattern: r"\b[a-z]\d+ \w+\b".to_string(),
            delimiter: default_identifier_delimiter(),
            decomposition: Decomposition::Compact,
        }
    }

    /// Spreadsheet labels: dot-separated plot, plant and leaf.
    pub fn spreadsheet_default() -> Self {
        Self {
            pattern: r"\b[a-z]\.\d+\.[a-z0-9]+\b".to_string(),
            delimiter: ".".to_string(),
            decomposition: Decomposition::Separated,
        }
    }
}

/// Where the raw exports live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// Interleaved text log (text-log path)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Directory of per-session export files (spreadsheet path)
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Column layout fixed by the instrument's export format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Header of the observation-number / remark column
    #[serde(default = "default_observation_column")]
    pub observation_column: String,

    /// Header of the time-of-day column
    #[serde(default = "default_time_column")]
    pub time_column: String,

    /// Observation value the instrument writes while warming up
    #[serde(default = "default_boot_marker")]
    pub boot_marker: String,

    /// Sensor channels carried to the output, matched verbatim
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
}

fn default_observation_column() -> String {
    "Obs".to_string()
}

fn default_time_column() -> String {
    "HHMMSS".to_string()
}

fn default_boot_marker() -> String {
    "in".to_string()
}

fn default_channels() -> Vec<String> {
    [
        "FTime", "EBal?", "Photo", "Cond", "Ci", "Trmmol", "VpdL", "CTleaf", "Area", "BLC_1",
        "StmRat", "BLCond", "Tair", "Tleaf", "TBlk", "CO2R", "CO2S", "H2OR", "H2OS", "RH_R",
        "RH_S", "Flow", "PARi", "PARo", "Press", "CsMch", "HsMch", "StableF", "Status",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            observation_column: default_observation_column(),
            time_column: default_time_column(),
            boot_marker: default_boot_marker(),
            channels: default_channels(),
        }
    }
}

/// Settings for the interleaved text-log path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLogConfig {
    /// Marker preceding each session's table header
    #[serde(default = "default_start_marker")]
    pub start_marker: String,

    /// Banner the instrument writes when a new session opens
    #[serde(default = "default_end_marker")]
    pub end_marker: String,

    /// Field delimiter inside a session body
    #[serde(default = "default_log_delimiter")]
    pub delimiter: char,

    #[serde(default = "IdentifierConfig::text_log_default")]
    pub identifier: IdentifierConfig,
}

fn default_start_marker() -> String {
    "$STARTOFDATA$".to_string()
}

fn default_end_marker() -> String {
    "OPEN".to_string()
}

fn default_log_delimiter() -> char {
    '\t'
}

impl Default for TextLogConfig {
    fn default() -> Self {
        Self {
            start_marker: default_start_marker(),
            end_marker: default_end_marker(),
            delimiter: default_log_delimiter(),
            identifier: IdentifierConfig::text_log_default(),
        }
    }
}

/// Settings for the per-file export path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadsheetConfig {
    /// File extensions treated as exports (case-insensitive)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_sheet_delimiter")]
    pub delimiter: char,

    #[serde(default = "IdentifierConfig::spreadsheet_default")]
    pub identifier: IdentifierConfig,
}

fn default_extensions() -> Vec<String> {
    vec!["csv".to_string(), "tsv".to_string(), "txt".to_string()]
}

fn default_sheet_delimiter() -> char {
    ','
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            delimiter: default_sheet_delimiter(),
            identifier: IdentifierConfig::spreadsheet_default(),
        }
    }
}

/// Output table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Calendar date combined with each row's time of day
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("tidy.csv")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            date: None,
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub schema: SchemaConfig,

    #[serde(default)]
    pub text_log: TextLogConfig,

    #[serde(default)]
    pub spreadsheet: SpreadsheetConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self).map_err(|e| ConfigError::Yaml {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
