//! # docs2md
//!
//! Convert document trees to clean Markdown for LLM context windows.
//!
//! ## Why this crate?
//!
//! Dumping extracted documents straight into a model's context wastes tokens
//! on extraction artefacts — smart quotes, zero-width characters, padded
//! spreadsheet cells, runs of blank lines — and a directory of documents
//! needs orchestration: stable ordering, per-file isolation, aggregate
//! statistics. This crate owns exactly those two problems. It implements no
//! format parser itself: anything that understands PDF layout or OOXML lives
//! behind the injected [`Extractor`] collaborator.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input (file or tree)
//!  │
//!  ├─ 1. Enumerate  walk the tree, sort by relative path (deterministic)
//!  ├─ 2. Filter     skip hidden/temp/unsupported/oversized, with reasons
//!  ├─ 3. Extract    injected collaborator: path → raw markdown/text
//!  ├─ 4. Sanitize   pure cleanup pass that shrinks token count
//!  ├─ 5. Write      mirrored .md tree, optional metadata headers
//!  └─ 6. Report     combined markdown + JSON metadata + summary
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docs2md::{BatchProcessor, PlainTextExtractor, ProcessingOptions};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ProcessingOptions::builder()
//!         .max_file_size_mb(50.0)
//!         .build()?;
//!     let processor = BatchProcessor::new(
//!         "docs/",
//!         "processed-docs/",
//!         options,
//!         Arc::new(PlainTextExtractor::new()),
//!     )?;
//!     let report = processor.run()?;
//!     eprintln!(
//!         "{} ok / {} failed / {} skipped, ~{} tokens",
//!         report.stats.succeeded,
//!         report.stats.failed,
//!         report.stats.skipped,
//!         report.stats.total_tokens,
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Failure isolation
//!
//! One document failing to convert never aborts the batch: the error is
//! recorded on that file's [`DocumentResult`] and processing continues. Only
//! a missing root input, invalid configuration, or an unwritable batch
//! artifact returns an error from [`BatchProcessor::run`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docs2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! docs2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod progress;
pub mod report;
pub mod sanitize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::BatchProcessor;
pub use config::{ProcessingOptions, ProcessingOptionsBuilder, DEFAULT_EXTENSIONS};
pub use error::{FileError, ProcessorError, SkipReason};
pub use extract::{ExtractError, Extraction, Extractor, PlainTextExtractor};
pub use output::{BatchReport, BatchStats, DocumentResult, DocumentStatus};
pub use progress::{NoopProgressCallback, ProcessingProgressCallback, ProgressCallback};
pub use report::{JsonArtifact, assemble_combined, build_json_artifact, render_summary};
pub use sanitize::{estimate_tokens, sanitize, sanitize_and_measure, TextStats};
