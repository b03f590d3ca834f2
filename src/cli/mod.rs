//! Command-line interface for the tidy pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::writers::write_tidy_csv;
use crate::processors::assembler::IdentifierColumn;
use crate::processors::pipeline::{self, PipelineError, RunSummary};
use crate::processors::TidyTable;
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "gasex-tidy")]
#[command(about = "Label gas-exchange readings from instrument remarks", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tidy an interleaved text log
    TextLog {
        /// Log file (defaults to input.log_file from the config)
        log_file: Option<PathBuf>,
        /// Output CSV (defaults to output.path from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Tidy a directory of per-session export files (best-effort)
    Spreadsheets {
        /// Directory of exports (defaults to input.directory from the config)
        directory: Option<PathBuf>,
        /// Output CSV (defaults to output.path from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the default configuration to a YAML file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 38 {
            let head: String = value.chars().take(35).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<38} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        None => PipelineConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::TextLog { log_file, output } => {
            cmd_text_log(log_file, output, &config);
        }
        Commands::Spreadsheets { directory, output } => {
            cmd_spreadsheets(directory, output, &config);
        }
        Commands::InitConfig { path } => {
            cmd_init_config(&path, &config);
        }
    }
}

/// Resolve an input path from the command line or the config, or exit.
fn require_input(cli_value: Option<PathBuf>, config_value: &Option<PathBuf>, what: &str) -> PathBuf {
    match cli_value.or_else(|| config_value.clone()) {
        Some(path) => path,
        None => {
            error!("No {} given on the command line or in the config", what);
            std::process::exit(1);
        }
    }
}

fn cmd_text_log(log_file: Option<PathBuf>, output: Option<PathBuf>, config: &PipelineConfig) {
    let input = require_input(log_file, &config.input.log_file, "log file");
    let output = output.unwrap_or_else(|| config.output.path.clone());

    println!("Tidying text log...");
    println!("Input: {}", input.display());
    println!("Output: {}", output.display());

    let start = Instant::now();
    let spinner = create_spinner("Splitting sessions and filling identifiers...");
    let result = pipeline::process_text_log(&input, config);
    spinner.finish_and_clear();

    finish_run("Text Log Tidy Complete", &input, &output, result, config, start);
}

fn cmd_spreadsheets(directory: Option<PathBuf>, output: Option<PathBuf>, config: &PipelineConfig) {
    let input = require_input(directory, &config.input.directory, "export directory");
    let output = output.unwrap_or_else(|| config.output.path.clone());

    println!("Tidying spreadsheet exports (best-effort)...");
    println!("Input directory: {}", input.display());
    println!("Output: {}", output.display());

    let start = Instant::now();
    let spinner = create_spinner("Loading exports and filling identifiers...");
    let result = pipeline::process_spreadsheets(&input, config);
    spinner.finish_and_clear();

    finish_run("Spreadsheet Tidy Complete", &input, &output, result, config, start);
}

/// Write the table and print the run summary, or exit on failure.
fn finish_run(
    title: &str,
    input: &Path,
    output: &Path,
    result: Result<(TidyTable, RunSummary), PipelineError>,
    config: &PipelineConfig,
    start: Instant,
) {
    let (table, summary) = match result {
        Ok(done) => done,
        Err(e) => {
            error!("Processing failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = write_tidy_csv(output, &table) {
        error!("Writing output failed: {}", e);
        std::process::exit(1);
    }

    let date = config
        .output
        .date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "none (timestamps empty)".to_string());

    print_summary(
        title,
        &[
            ("Input", input.display().to_string()),
            ("Output", output.display().to_string()),
            ("Sessions", summary.sessions_seen.to_string()),
            ("Sessions dropped", summary.sessions_dropped.to_string()),
            ("Remark rows", summary.rows.remark_rows.to_string()),
            ("Boot-noise rows", summary.rows.boot_noise_rows.to_string()),
            ("Unlabelled dropped", summary.rows.unlabelled_rows.to_string()),
            ("Rows written", table.len().to_string()),
            ("Plots", table.levels(IdentifierColumn::Plot).len().to_string()),
            ("Coercion failures", summary.coercion_failures.to_string()),
            ("Date", date),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

fn cmd_init_config(path: &Path, config: &PipelineConfig) {
    match config.to_yaml(path) {
        Ok(()) => println!("Wrote configuration to {}", path.display()),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_text_log_command() {
        let cli = Cli::try_parse_from(["gasex-tidy", "-vv", "text-log", "field.log", "-o", "out.csv"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::TextLog { log_file, output } => {
                assert_eq!(log_file, Some(PathBuf::from("field.log")));
                assert_eq!(output, Some(PathBuf::from("out.csv")));
            }
            _ => panic!("Expected TextLog command"),
        }
    }

    #[test]
    fn test_parse_spreadsheets_uses_config_paths() {
        let cli = Cli::try_parse_from(["gasex-tidy", "--config", "site.yaml", "spreadsheets"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("site.yaml")));
        assert!(matches!(
            cli.command,
            Commands::Spreadsheets {
                directory: None,
                output: None
            }
        ));
    }
}
