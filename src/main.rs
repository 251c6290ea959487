//! SoilBrief - analytics for soil boring field reports
//!
//! A CLI tool that turns borehole logs into dashboards and periodic
//! summaries, and answers questions grounded in the logs using Ollama.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable source, config, etc.)

mod analysis;
mod cli;
mod config;
mod llm;
mod models;
mod report;
mod source;

use anyhow::{bail, Context, Result};
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE};
use llm::{answer_question, ChatTurn, NarrativeGenerator, OllamaClient, Question};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };
    init_logging(level)?;

    info!("SoilBrief v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run(&args, &config).await {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .soilbrief.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the data source, model, and report sizes.");
    Ok(())
}

/// Initialize logging. Logs go to stderr so reports can be piped.
fn init_logging(level: tracing::Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems with the default file are
/// reported on stderr directly.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}

/// Narrative generator for report commands, or a disabled one.
fn build_narrator(config: &Config) -> Result<NarrativeGenerator> {
    if !config.general.narratives {
        debug!("Narratives disabled");
        return Ok(NarrativeGenerator::disabled());
    }

    let client = OllamaClient::new(config.model.ollama())?;
    Ok(NarrativeGenerator::new(
        Arc::new(client),
        Duration::from_secs(config.model.narrative_timeout_seconds),
    ))
}

/// Load prior conversation turns from a JSON file.
fn load_history(path: Option<&Path>) -> Result<Vec<ChatTurn>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse history file: {}", path.display()))
}

/// Render a result as JSON or with its Markdown renderer.
fn render<T: Serialize>(
    format: OutputFormat,
    value: &T,
    markdown: impl Fn(&T) -> String,
) -> Result<String> {
    match format {
        OutputFormat::Json => report::generate_json_report(value),
        OutputFormat::Markdown => Ok(markdown(value)),
    }
}

/// Run the selected command.
async fn run(args: &Args, config: &Config) -> Result<()> {
    let Some(ref command) = args.command else {
        bail!("A command is required: dashboard, summary or ask");
    };

    let data_path = PathBuf::from(&config.general.data);
    let records = source::load_records(&data_path)?;
    let options = config.analytics.report_options();

    let output = match command {
        Command::Dashboard => {
            let narrator = build_narrator(config)?;
            let report = report::build_dashboard_report(&records, &options, &narrator).await;
            info!(
                "Dashboard covers {} boreholes across {} projects",
                report.total_boreholes, report.active_projects
            );
            render(args.format, &report, report::generate_markdown_dashboard)?
        }
        Command::Summary(summary) => {
            let query = summary.to_query().map_err(anyhow::Error::msg)?;
            let narrator = build_narrator(config)?;
            let report = report::build_summary_report(&records, &query, &options, &narrator).await;
            info!(
                "{} summary covers {} boreholes",
                report.period, report.stats.boreholes
            );
            render(args.format, &report, report::generate_markdown_summary)?
        }
        Command::Ask(ask) => {
            let client = OllamaClient::new(config.model.ollama())?;
            let history = load_history(ask.history.as_deref())?;
            let question = Question {
                text: &ask.question,
                user_context: ask.context.as_deref(),
                history: &history,
                max_rows: ask.max_rows.unwrap_or(config.analytics.context_max_rows),
            };
            let answer = answer_question(
                &client,
                &question,
                &records,
                Duration::from_secs(config.model.ask_timeout_seconds),
            )
            .await;
            render(args.format, &answer, |a| {
                report::generate_markdown_answer(&ask.question, a)
            })?
        }
    };

    match args.output {
        Some(ref path) => {
            report::write_report(&output, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                eprintln!("✅ Report saved to: {}", path.display());
            }
        }
        None => println!("{}", output),
    }

    Ok(())
}
