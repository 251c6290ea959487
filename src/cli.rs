//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap, including
//! validation of summary period parameters.

use crate::models::{Period, PeriodQuery};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SoilBrief - analytics for soil boring field reports
///
/// Builds dashboards and weekly/monthly summaries from borehole logs and
/// answers questions grounded in the data using a local Ollama model.
///
/// Examples:
///   soilbrief dashboard --data data/reports.csv
///   soilbrief summary --period weekly --start-date 2024-03-01 --end-date 2024-03-07
///   soilbrief summary --period monthly --month 3 --year 2024 --format markdown
///   soilbrief ask "Which boreholes hit groundwater above 3 m?"
///   soilbrief --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Record source (CSV export or JSON array)
    ///
    /// Defaults to the config file value, then data/reports.csv.
    #[arg(short, long, value_name = "FILE", env = "SOILBRIEF_DATA", global = true)]
    pub data: Option<PathBuf>,

    /// Ollama model used for narratives and answers
    #[arg(short, long, env = "OLLAMA_MODEL", global = true)]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, value_name = "URL", env = "OLLAMA_URL", global = true)]
    pub ollama_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .soilbrief.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Write the output to a file instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Output format (json, markdown)
    #[arg(long, default_value = "json", value_name = "FORMAT", global = true)]
    pub format: OutputFormat,

    /// Timeout in seconds for text-generation requests
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Skip narrative generation in reports
    #[arg(long, global = true)]
    pub no_narrative: bool,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .soilbrief.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Snapshot over every dated field report
    Dashboard,
    /// Weekly or monthly summary
    Summary(SummaryArgs),
    /// Ask a question answered from the field reports
    Ask(AskArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct SummaryArgs {
    /// Summary period
    #[arg(long, value_enum, default_value = "weekly")]
    pub period: Period,

    /// Start date (YYYY-MM-DD) for weekly summaries
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<String>,

    /// End date (YYYY-MM-DD) for weekly summaries
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<String>,

    /// Month number for monthly summaries
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Year for monthly summaries
    #[arg(long, value_parser = clap::value_parser!(i32).range(2000..=2100))]
    pub year: Option<i32>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AskArgs {
    /// The question to answer
    pub question: String,

    /// Extra context placed ahead of the data snapshot
    #[arg(long)]
    pub context: Option<String>,

    /// JSON file with prior turns: [{"role": "user", "content": "..."}]
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// Maximum records included in the data snapshot
    #[arg(long, value_name = "ROWS")]
    pub max_rows: Option<usize>,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON format (default)
    #[default]
    Json,
    /// Markdown format
    Markdown,
}

fn parse_cli_date(value: Option<&str>, label: &str) -> Result<Option<NaiveDate>, String> {
    match value {
        None | Some("") => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("Invalid {}; use YYYY-MM-DD", label)),
    }
}

impl SummaryArgs {
    /// Validate the period parameters and build the query.
    pub fn to_query(&self) -> Result<PeriodQuery, String> {
        let start = parse_cli_date(self.start_date.as_deref(), "--start-date")?;
        let end = parse_cli_date(self.end_date.as_deref(), "--end-date")?;

        match self.period {
            Period::Weekly => match (start, end) {
                (Some(s), Some(e)) if s > e => {
                    Err("--start-date must be before --end-date".to_string())
                }
                (Some(s), Some(e)) => Ok(PeriodQuery::weekly_between(s, e)),
                (None, None) => Ok(PeriodQuery::weekly()),
                _ => Err("Provide both --start-date and --end-date for weekly summaries".to_string()),
            },
            Period::Monthly => {
                let base = match (self.month, self.year) {
                    (Some(m), Some(y)) => PeriodQuery::monthly_of(m, y),
                    (None, None) => PeriodQuery::monthly(),
                    _ => {
                        return Err(
                            "Provide both --month and --year for monthly summaries".to_string()
                        )
                    }
                };
                Ok(PeriodQuery {
                    start_date: start,
                    end_date: end,
                    ..base
                })
            }
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(ref command) = self.command else {
            return Err("A command is required: dashboard, summary or ask".to_string());
        };

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        match command {
            Command::Dashboard => {}
            Command::Summary(summary) => {
                summary.to_query()?;
            }
            Command::Ask(ask) => {
                if ask.question.trim().is_empty() {
                    return Err("Question must not be empty".to_string());
                }
                if ask.max_rows == Some(0) {
                    return Err("Max rows must be at least 1".to_string());
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
