//! CLI binary for docmimic.
//!
//! A thin shim over the library crate: loads a narrative file into a
//! session, uploads the reference image, generates and exports.

use anyhow::{Context, Result};
use clap::Parser;
use docmimic::export::save_artifact;
use docmimic::{
    DocMimicError, EditingSurface, HeadlessSurface, IncomingFile, Locale, PaperSize, PdfExporter, PdfOutcome,
    Session, SessionObserver, SessionPhase, StudioConfig, Synchronizer,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Terminal observer using indicatif ────────────────────────────────────────

/// Mirrors session events onto a single spinner line.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new(visible: bool) -> Arc<Self> {
        let bar = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl SessionObserver for CliObserver {
    fn on_phase_changed(&self, phase: SessionPhase) {
        match phase {
            SessionPhase::Generating => {
                self.bar.set_prefix("Generating");
                self.bar.set_message("mimicking reference layout…");
            }
            SessionPhase::Success => self.bar.println(format!("  {} Layout generated", green("✓"))),
            SessionPhase::Error => self.bar.println(format!("  {} Generation failed", red("✗"))),
            SessionPhase::Idle => {}
        }
    }

    fn on_message_changed(&self, message: Option<&str>) {
        if let Some(m) = message {
            self.bar.println(format!("  {} {}", cyan("ℹ"), m));
        }
    }

    fn on_analysis_started(&self) {
        self.bar.set_prefix("Analyzing");
        self.bar.set_message("reviewing narrative…");
    }

    fn on_analysis_finished(&self, success: bool) {
        if success {
            self.bar.println(format!("  {} Analysis ready", green("✓")));
        }
    }

    fn on_export_started(&self, file_name: &str) {
        self.bar.set_prefix("Exporting");
        self.bar.set_message(file_name.to_string());
    }

    fn on_notice(&self, notice: &str) {
        self.bar.println(format!("  {} {}", cyan("⚠"), notice));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate a Word document next to the narrative
  docmimic notulen.html --reference template.png

  # Letter paper, output into ./out
  docmimic notulen.html --reference template.jpg --paper letter --out out

  # Editorial review first, English messages
  docmimic notulen.html --reference template.png --analyze --locale en

  # Reference image from a URL, JSON summary on stdout
  docmimic notulen.html --reference https://example.com/surat.png --json

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  DOCMIMIC_PAPER          Default paper size
  DOCMIMIC_OUT            Default output directory
"#;

/// Reformat narrative text to mimic a reference document layout.
#[derive(Parser, Debug)]
#[command(
    name = "docmimic",
    version,
    about = "Reformat narrative text to mimic a reference document layout",
    long_about = "Send a narrative (plain text or HTML) together with a picture of an existing \
document to a vision LLM and get back a Word-compatible document that follows the picture's \
layout. Supports Gemini, OpenAI, Anthropic and any provider edgequake-llm knows about.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Narrative file (plain text or HTML fragment).
    narrative: PathBuf,

    /// Reference layout image: local path or HTTP/HTTPS URL.
    #[arg(short, long, env = "DOCMIMIC_REFERENCE")]
    reference: String,

    /// Paper size: A4, Letter, Legal, A3, A5.
    #[arg(long, env = "DOCMIMIC_PAPER", default_value = "A4")]
    paper: PaperSize,

    /// Output directory for exported files.
    #[arg(short, long, env = "DOCMIMIC_OUT", default_value = ".")]
    out: PathBuf,

    /// Base name of exported files (extension added per format).
    #[arg(long, env = "DOCMIMIC_NAME", default_value = docmimic::DEFAULT_EXPORT_BASE_NAME)]
    name: String,

    /// Run an editorial analysis of the narrative before generating.
    #[arg(long, env = "DOCMIMIC_ANALYZE")]
    analyze: bool,

    /// Also export a PDF of the preview.
    #[arg(long, env = "DOCMIMIC_PDF")]
    pdf: bool,

    /// Language of user-facing messages.
    #[arg(long, env = "DOCMIMIC_LOCALE", value_enum, default_value = "id")]
    locale: LocaleArg,

    /// LLM model ID (e.g. gemini-2.5-flash, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Max LLM output tokens.
    #[arg(long, env = "DOCMIMIC_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "DOCMIMIC_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds for URL references.
    #[arg(long, env = "DOCMIMIC_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print a JSON session snapshot to stdout.
    #[arg(long, env = "DOCMIMIC_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCMIMIC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCMIMIC_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LocaleArg {
    Id,
    En,
}

impl From<LocaleArg> for Locale {
    fn from(v: LocaleArg) -> Self {
        match v {
            LocaleArg::Id => Locale::Indonesian,
            LocaleArg::En => Locale::English,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner carries progress; library INFO logs would tear it.
    let show_progress = !cli.quiet && !cli.json;
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

    let started = Instant::now();
    let config = build_config(&cli)?;
    let observer = CliObserver::new(show_progress);
    let session = Session::with_observer(
        config.clone(),
        Arc::new(docmimic::LlmBackend::new(config.clone())),
        observer.clone(),
    );
    session.set_paper_size(cli.paper);

    // ── Narrative → session, through the editing surface ────────────────
    let narrative = tokio::fs::read_to_string(&cli.narrative)
        .await
        .with_context(|| format!("Failed to read narrative from {:?}", cli.narrative))?;
    let mut editor = Synchronizer::mount(
        HeadlessSurface::new(),
        &session.narrative(),
        session.narrative_writer(),
        config.sync_policy,
    );
    editor.surface_mut().focus();
    editor.surface_mut().type_text(narrative.trim_end());
    editor.handle_input();
    editor.render(&session.narrative());

    // ── Reference image ──────────────────────────────────────────────────
    observer.bar.set_prefix("Uploading");
    observer.bar.set_message(cli.reference.clone());
    session
        .upload_reference(IncomingFile::from_input(&cli.reference))
        .await
        .context("Reference image rejected")?;

    // ── Analysis (optional) and generation, concurrently ─────────────────
    let (analysis, generation) = if cli.analyze {
        let (a, g) = futures::join!(session.analyze(), session.generate());
        (Some(a), g)
    } else {
        (None, session.generate().await)
    };

    match analysis {
        Some(Ok(outcome)) => {
            if let (Some(report), false) = (outcome.completed(), cli.json) {
                observer.bar.suspend(|| {
                    eprintln!("{}", bold("Analysis:"));
                    eprintln!("{}", report.markup.trim());
                });
            }
        }
        // Advisory only; the failure message was already surfaced.
        Some(Err(e)) if !e.is_validation() => {}
        Some(Err(e)) => return Err(e.into()),
        None => {}
    }
    generation.context("Generation failed")?;

    // ── Export ───────────────────────────────────────────────────────────
    let mut written = Vec::new();
    if let Some(package) = session.word_package() {
        observer.on_export_started(&package.file_name);
        let path = save_artifact(&cli.out, &package.file_name, &package.bytes)?;
        observer.on_export_settled(&package.file_name, true);
        written.push(path);
    }

    if cli.pdf {
        // No HTML rasterizer ships with the CLI.
        let exporter = PdfExporter::new(&config, None).with_observer(observer.clone());
        match exporter.export(session.preview_region().as_ref()).await {
            Ok(PdfOutcome::Rendered(pkg)) => {
                written.push(save_artifact(&cli.out, &pkg.file_name, &pkg.bytes)?);
            }
            Ok(PdfOutcome::Skipped) => {}
            Err(DocMimicError::RendererUnavailable { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }

    observer.bar.finish_and_clear();

    if cli.json {
        let report = serde_json::json!({
            "session": session.snapshot(),
            "written": written,
            "elapsed_ms": started.elapsed().as_millis() as u64,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        for path in &written {
            eprintln!("{}  {}", green("✔"), bold(&path.display().to_string()));
        }
        eprintln!(
            "   {} on {} in {:.1}s",
            dim(&format!("{} chars", session.narrative_char_count())),
            session.paper_size(),
            started.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Map CLI args to `StudioConfig`.
fn build_config(cli: &Cli) -> Result<StudioConfig> {
    let mut builder = StudioConfig::builder()
        .locale(cli.locale.into())
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .export_base_name(cli.name.clone());

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }

    builder.build().context("Invalid configuration")
}
