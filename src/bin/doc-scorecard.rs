//! CLI binary for doc-scorecard.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, follows the event stream with a spinner, and prints the
//! scorecard or JSON.

use anyhow::{Context, Result};
use clap::Parser;
use doc_scorecard::pipeline::input::resolve_input;
use doc_scorecard::{scorecard, AnalysisConfig, AnalysisEvent, AnalysisOutput, Analyzer, Severity};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scorecard on stdout
  doc-scorecard contract.pdf

  # Validated analysis as JSON (wire schema)
  doc-scorecard --json contract.pdf > analysis.json

  # JSON including severities, reasons and recommendations
  doc-scorecard --json --annotated contract.pdf

  # Use a specific model
  doc-scorecard --provider anthropic --model claude-sonnet-4-20250514 contract.pdf

  # Analyse a PDF from a URL
  doc-scorecard https://example.com/forms/application.pdf

  # Fail the build when any field is high risk
  doc-scorecard --fail-on high contract.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Fine-grained log filter (overrides --verbose/--quiet)
"#;

/// Score a PDF document for missing fields, signatures and pages.
#[derive(Parser, Debug)]
#[command(
    name = "doc-scorecard",
    version,
    about = "Analyse a PDF with a multimodal LLM and print a risk scorecard",
    long_about = "Send a PDF (local file or URL) to a multimodal model, validate the structured \
answer while it streams, and classify every expected field and missing page as Low, Medium or \
High risk. Supports OpenAI, Anthropic, Google Gemini and any provider edgequake-llm knows.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, env = "DOC_SCORECARD_OUTPUT")]
    output: Option<PathBuf>,

    /// Output the validated analysis as JSON instead of the scorecard.
    #[arg(long, env = "DOC_SCORECARD_JSON")]
    json: bool,

    /// With --json: include severities, reasons and recommendations.
    #[arg(long, requires = "json")]
    annotated: bool,

    /// LLM model ID (e.g. gpt-4o-mini, gemini-2.0-flash).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "DOC_SCORECARD_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Path to a text file containing a custom user instruction.
    #[arg(long, env = "DOC_SCORECARD_USER_PROMPT")]
    user_prompt: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "DOC_SCORECARD_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DOC_SCORECARD_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Whole-analysis timeout in seconds.
    #[arg(long, env = "DOC_SCORECARD_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOC_SCORECARD_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Exit with status 2 when any field or page reaches this severity.
    #[arg(long, value_enum)]
    fail_on: Option<SeverityArg>,

    /// Disable the progress spinner.
    #[arg(long, env = "DOC_SCORECARD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC_SCORECARD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC_SCORECARD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SeverityArg {
    Low,
    Medium,
    High,
}

impl From<SeverityArg> for Severity {
    fn from(v: SeverityArg) -> Self {
        match v {
            SeverityArg::Low => Severity::Low,
            SeverityArg::Medium => Severity::Medium,
            SeverityArg::High => Severity::High,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters, so library INFO logs
    // are suppressed while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;

    let document = resolve_input(&cli.input, config.download_timeout_secs)
        .await
        .with_context(|| format!("Failed to read {}", cli.input))?;
    let analyzer = Analyzer::new(config).context("Failed to set up the LLM provider")?;

    let output = run_with_events(&analyzer, document, show_progress).await?;

    // ── Render ───────────────────────────────────────────────────────────
    let rendered = if cli.json {
        let json = if cli.annotated {
            serde_json::to_string_pretty(&*output.scored)
        } else {
            serde_json::to_string_pretty(output.analysis())
        };
        json.context("Failed to serialise output")?
    } else {
        scorecard::render(&output.scored)
    };

    if let Some(ref path) = cli.output {
        tokio::fs::write(path, rendered.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet {
        let dist = output.scored.distribution();
        eprintln!(
            "   {} high  /  {} medium  /  {} low  —  {}ms  {}",
            red(&dist.high.to_string()),
            yellow(&dist.medium.to_string()),
            green(&dist.low.to_string()),
            output.duration_ms,
            dim(output.fingerprint.short()),
        );
    }

    if let (Some(threshold), Some(worst)) = (cli.fail_on, output.scored.worst_severity()) {
        if worst >= Severity::from(threshold) {
            eprintln!("{} {} risk found", red("✘"), worst);
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Follow the event stream, updating a spinner from partial snapshots.
async fn run_with_events(
    analyzer: &Analyzer,
    document: doc_scorecard::Document,
    show_progress: bool,
) -> Result<AnalysisOutput> {
    let bar = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Analyzing");
        bar.set_message("sending document…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let mut events = analyzer
        .analyze_stream(document)
        .context("Analysis request rejected")?;

    let mut outcome = None;
    while let Some(event) = events.next().await {
        match event {
            AnalysisEvent::Started { fingerprint } => {
                if let Some(ref bar) = bar {
                    bar.set_message(format!("waiting for model  {}", dim(fingerprint.short())));
                }
            }
            AnalysisEvent::Partial(partial) => {
                if let Some(ref bar) = bar {
                    bar.set_message(format!("{} field(s) received", partial.field_count()));
                }
            }
            AnalysisEvent::Finalized(output) => {
                outcome = Some(Ok(output));
            }
            AnalysisEvent::Failed(e) => {
                outcome = Some(Err(e));
            }
        }
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match outcome {
        Some(Ok(output)) => Ok(output),
        Some(Err(e)) => {
            let hint = if e.is_retryable() {
                " (transient, retry later)"
            } else {
                ""
            };
            Err(anyhow::Error::new(e).context(format!("Analysis failed{hint}")))
        }
        None => anyhow::bail!("Analysis ended without a result"),
    }
}

/// Map CLI args to `AnalysisConfig`.
async fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .timeout_secs(cli.timeout)
        .pending_ttl_secs(cli.timeout.saturating_mul(2))
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref path) = cli.user_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read user prompt from {:?}", path))?;
        builder = builder.user_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
