//! CLI binary for docs2md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ProcessingOptions` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use docs2md::{
    BatchProcessor, PlainTextExtractor, ProcessingOptions, ProcessingProgressCallback,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-file log
/// lines using [indicatif].
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>4}/{len} files  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ProcessingProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
    }

    fn on_file_complete(&self, _index: usize, _total: usize, path: &str, tokens: usize) {
        self.bar.println(format!(
            "  {} {:<52} {}",
            green("✓"),
            path,
            dim(&format!("~{tokens} tokens"))
        ));
        self.bar.inc(1);
    }

    fn on_file_skipped(&self, _index: usize, _total: usize, path: &str, reason: &str) {
        self.bar.println(format!(
            "  {} {:<52} {}",
            yellow("−"),
            path,
            dim(reason)
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, _index: usize, _total: usize, path: &str, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {:<52} {}", red("✗"), path, red(&msg)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total_files: usize, _succeeded: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process a single file (output lands next to it)
  docs2md document.txt

  # Process a folder (creates processed-<foldername> by default)
  docs2md ./docs

  # Process a folder into an explicit output directory
  docs2md ./docs -o ./context

  # Disable JSON metadata and the combined file
  docs2md ./docs --no-json --no-combined-file

  # Include the full sanitized text in the JSON artifact
  docs2md ./docs --include-content-in-json

  # Use a YAML configuration file
  docs2md ./docs -c docs2md.yaml

  # Generate a default configuration file and exit
  docs2md --generate-config docs2md.yaml

OUTPUT LAYOUT (directory mode):
  <output>/<mirrored tree>/<doc>.md    one markdown file per input document
  <output>/combined-<input>.md         all succeeded documents, one file
  <output>/<output>.json               batch + per-document metadata
  <output>/<output>-summary.txt        human-readable token breakdown

ENVIRONMENT VARIABLES:
  DOCS2MD_OUTPUT   Default output directory (same as --output-dir)
  RUST_LOG         Tracing filter, e.g. RUST_LOG=docs2md=debug
"#;

/// Convert document trees to clean Markdown for LLM context windows.
#[derive(Parser, Debug)]
#[command(
    name = "docs2md",
    version,
    about = "Convert document trees to clean Markdown for LLM context windows",
    long_about = "Walk a file or directory tree, convert each document to Markdown, sanitize the \
text to reduce token count, and emit per-file outputs plus an optional combined document and \
JSON metadata artifact. Format parsing is delegated to a pluggable extractor; the built-in one \
handles plain-text formats (.txt, .md, .csv, .html, ...).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input file or directory to process.
    #[arg(required_unless_present = "generate_config")]
    input_path: Option<PathBuf>,

    /// Output directory (default: next to the input; `processed-<name>` for
    /// directories).
    #[arg(short, long, env = "DOCS2MD_OUTPUT")]
    output_dir: Option<PathBuf>,

    /// Path to a YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate a default configuration file at PATH and exit.
    #[arg(long, value_name = "PATH")]
    generate_config: Option<PathBuf>,

    /// Don't prepend metadata headers to per-file outputs.
    #[arg(long)]
    no_metadata_header: bool,

    /// Maximum file size to process in MB (default: 100).
    #[arg(long, value_name = "MB")]
    max_file_size: Option<f64>,

    /// Disable the JSON metadata artifact.
    #[arg(long)]
    no_json: bool,

    /// Don't create the combined markdown file.
    #[arg(long)]
    no_combined_file: bool,

    /// Include full sanitized text in the JSON artifact (memory intensive).
    #[arg(long)]
    include_content_in_json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Generate-config mode ─────────────────────────────────────────────
    if let Some(ref path) = cli.generate_config {
        ProcessingOptions::default()
            .to_yaml_file(path)
            .context("Failed to write configuration file")?;
        println!("Generated default configuration at: {}", path.display());
        return Ok(());
    }

    let input_path = cli
        .input_path
        .clone()
        .context("input_path is required unless --generate-config is used")?;

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active; the
    // bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    // ── Resolve output location ──────────────────────────────────────────
    let output_dir = match cli.output_dir.clone() {
        Some(dir) => dir,
        None => default_output_dir(&input_path),
    };

    // ── Build options ────────────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ProcessingProgressCallback>)
    } else {
        None
    };
    let options = build_options(&cli, progress)?;

    // ── Run the batch ────────────────────────────────────────────────────
    let processor = BatchProcessor::new(
        &input_path,
        &output_dir,
        options,
        Arc::new(PlainTextExtractor::new()),
    )
    .context("Invalid input/output combination")?;

    if !cli.quiet {
        eprintln!("{}  {}", bold("Input: "), input_path.display());
        eprintln!("{}  {}", bold("Output:"), output_dir.display());
    }

    let report = processor.run().context("Processing failed")?;

    // ── Summary ──────────────────────────────────────────────────────────
    if !cli.quiet {
        let stats = &report.stats;
        let tick = if stats.failed == 0 {
            green("✔")
        } else {
            yellow("⚠")
        };
        eprintln!(
            "{tick}  {} succeeded, {} failed, {} skipped of {} files",
            bold(&stats.succeeded.to_string()),
            if stats.failed > 0 {
                red(&stats.failed.to_string())
            } else {
                stats.failed.to_string()
            },
            stats.skipped,
            stats.total_visited(),
        );
        eprintln!(
            "   {} chars  /  {} words  /  ~{} tokens",
            dim(&stats.total_chars.to_string()),
            dim(&stats.total_words.to_string()),
            dim(&stats.total_tokens.to_string()),
        );
        if let Some(ref path) = report.combined_path {
            eprintln!("   combined: {}", path.display());
        }
        if let Some(ref path) = report.json_path {
            eprintln!("   metadata: {}", path.display());
        }
        if let Some(ref path) = report.summary_path {
            eprintln!("   summary:  {}", path.display());
        }
    }

    // A batch where every visited file failed is an unusable run; make the
    // exit code say so even though the library treats it as a completed batch.
    if report.stats.total_visited() > 0 && report.stats.succeeded == 0 && report.stats.failed > 0 {
        anyhow::bail!("all {} processed files failed", report.stats.failed);
    }

    Ok(())
}

/// Default output next to the input: a sibling `processed-<name>` directory
/// for directory inputs, the containing directory for file inputs.
fn default_output_dir(input: &Path) -> PathBuf {
    // A bare file name has an empty parent; treat that as the current dir.
    let parent = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    if input.is_dir() {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        parent.join(format!("processed-{name}"))
    } else {
        parent
    }
}

/// Map CLI args onto `ProcessingOptions`: YAML file first, flags override.
fn build_options(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ProcessingOptions> {
    let mut options = if let Some(ref path) = cli.config {
        ProcessingOptions::from_yaml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?
    } else {
        ProcessingOptions::default()
    };

    if cli.no_metadata_header {
        options.include_metadata_header = false;
    }
    if let Some(mb) = cli.max_file_size {
        anyhow::ensure!(mb > 0.0, "--max-file-size must be positive, got {mb}");
        options.max_file_size_mb = mb;
    }
    if cli.no_json {
        options.json_enabled = false;
    }
    if cli.no_combined_file {
        options.create_combined_file = false;
    }
    if cli.include_content_in_json {
        options.include_content_in_json = true;
    }
    options.progress = progress;

    Ok(options)
}
