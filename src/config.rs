//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.soilbrief.toml` files.

use crate::llm::{OllamaConfig, ASK_TIMEOUT_SECS, NARRATIVE_TIMEOUT_SECS};
use crate::report::ReportOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".soilbrief.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Analytics settings.
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Path to the record source (CSV or JSON).
    #[serde(default = "default_data")]
    pub data: String,

    /// Generate narratives for reports.
    #[serde(default = "default_true")]
    pub narratives: bool,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data: default_data(),
            narratives: true,
            verbose: false,
        }
    }
}

fn default_data() -> String {
    "data/reports.csv".to_string()
}

fn default_true() -> bool {
    true
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Timeout for report narratives in seconds.
    #[serde(default = "default_narrative_timeout")]
    pub narrative_timeout_seconds: u64,

    /// Timeout for direct questions in seconds.
    #[serde(default = "default_ask_timeout")]
    pub ask_timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            narrative_timeout_seconds: default_narrative_timeout(),
            ask_timeout_seconds: default_ask_timeout(),
        }
    }
}

fn default_model() -> String {
    "gpt-oss:120b-cloud".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_narrative_timeout() -> u64 {
    NARRATIVE_TIMEOUT_SECS
}

fn default_ask_timeout() -> u64 {
    ASK_TIMEOUT_SECS
}

impl ModelConfig {
    pub fn ollama(&self) -> OllamaConfig {
        OllamaConfig {
            ollama_url: self.ollama_url.clone(),
            model_name: self.name.clone(),
            temperature: self.temperature,
        }
    }
}

/// Report and context sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Rows included in a Q&A data snapshot.
    #[serde(default = "default_context_rows")]
    pub context_max_rows: usize,

    /// Entries in the dashboard's recent list.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    /// Highlight lines in a summary.
    #[serde(default = "default_highlight_limit")]
    pub highlight_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            context_max_rows: default_context_rows(),
            recent_limit: default_recent_limit(),
            highlight_limit: default_highlight_limit(),
        }
    }
}

fn default_context_rows() -> usize {
    crate::analysis::DEFAULT_MAX_ROWS
}

fn default_recent_limit() -> usize {
    5
}

fn default_highlight_limit() -> usize {
    3
}

impl AnalyticsConfig {
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            recent_limit: self.recent_limit,
            highlight_limit: self.highlight_limit,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values explicitly given on the command line (or via env) override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.general.data = data.display().to_string();
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.narrative_timeout_seconds = timeout;
            self.model.ask_timeout_seconds = timeout;
        }

        if args.no_narrative {
            self.general.narratives = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
