//! Batch orchestration: drive a full run over a file or a directory tree.
//!
//! ## Data Flow
//!
//! ```text
//! input tree ──▶ enumerate ──▶ skip policy ──▶ extract ──▶ sanitize ──▶ write
//!                (walkdir,      (hidden/temp/   (injected    (pure)      (.md tree)
//!                 sorted)        ext/size)       collaborator)
//!                                                                          │
//!                              combined.md + metadata.json + summary ◀─────┘
//! ```
//!
//! The run is single-threaded and synchronous: each file is fully read,
//! converted, sanitized, and written before the next is visited, and file
//! handles never outlive one file's step. The only accumulating state is the
//! orchestrator-owned result vector, appended at file boundaries.
//!
//! ## Determinism
//!
//! Files are processed in one stable order — pure lexicographic over the
//! POSIX-style relative path — and the combined document, JSON document
//! list, and summary all reuse that order. Two runs over the same unchanged
//! tree produce byte-identical combined output.
//!
//! ## Failure isolation
//!
//! A file that fails to convert or write gets its error recorded on its
//! [`DocumentResult`] and the batch moves on; only a missing root input or
//! an unwritable batch artifact aborts the run.

use crate::config::ProcessingOptions;
use crate::error::{FileError, ProcessorError, SkipReason};
use crate::extract::Extractor;
use crate::output::{BatchReport, BatchStats, DocumentResult};
use crate::report;
use crate::sanitize::{sanitize_and_measure, TextStats};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// OS/editor junk files skipped by the temp-file policy regardless of
/// extension.
const JUNK_FILE_NAMES: &[&str] = &[".ds_store", "thumbs.db", "desktop.ini"];

/// Orchestrates one batch run. Construct once per run; the options and
/// extractor are fixed at construction so repeated runs cannot interfere.
pub struct BatchProcessor {
    input_root: PathBuf,
    output_root: PathBuf,
    options: ProcessingOptions,
    extractor: Arc<dyn Extractor>,
}

impl std::fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("input_root", &self.input_root)
            .field("output_root", &self.output_root)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl BatchProcessor {
    /// Create a processor for `input` (file or directory) writing under
    /// `output`.
    ///
    /// Rejects an output path equal to the input path, and an output
    /// directory nested inside an input directory — either would make the
    /// run re-ingest its own output.
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        options: ProcessingOptions,
        extractor: Arc<dyn Extractor>,
    ) -> Result<Self, ProcessorError> {
        let input_root = input.into();
        let output_root = output.into();

        if input_root == output_root {
            return Err(ProcessorError::InvalidOutputLocation {
                output: output_root,
                detail: "input and output paths must differ".to_string(),
            });
        }
        if input_root.is_dir() && output_root.starts_with(&input_root) {
            return Err(ProcessorError::InvalidOutputLocation {
                output: output_root,
                detail: format!(
                    "output directory cannot be inside the input directory '{}'",
                    input_root.display()
                ),
            });
        }

        Ok(Self {
            input_root,
            output_root,
            options,
            extractor,
        })
    }

    /// Run the batch to completion.
    ///
    /// Returns the full report even when every file failed; only a missing
    /// root input or an unwritable batch artifact returns `Err`.
    pub fn run(&self) -> Result<BatchReport, ProcessorError> {
        if !self.input_root.exists() {
            return Err(ProcessorError::InputNotFound {
                path: self.input_root.clone(),
            });
        }
        let started_at = Utc::now();
        if self.input_root.is_file() {
            self.run_single_file(started_at)
        } else {
            self.run_directory(started_at)
        }
    }

    // ── Single-file mode ─────────────────────────────────────────────────

    fn run_single_file(&self, started_at: DateTime<Utc>) -> Result<BatchReport, ProcessorError> {
        let rel = self
            .input_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input_root.display().to_string());

        if let Some(cb) = &self.options.progress {
            cb.on_batch_start(1);
        }
        let result = self.visit_file(&self.input_root, &rel, 0, 1);
        let finished_at = Utc::now();
        let stats = BatchStats::from_results(std::slice::from_ref(&result), started_at, finished_at);
        if let Some(cb) = &self.options.progress {
            cb.on_batch_complete(1, stats.succeeded);
        }

        Ok(BatchReport {
            results: vec![result],
            stats,
            output_root: self.output_root.clone(),
            json_path: None,
            combined_path: None,
            summary_path: None,
        })
    }

    // ── Directory mode ───────────────────────────────────────────────────

    fn run_directory(&self, started_at: DateTime<Utc>) -> Result<BatchReport, ProcessorError> {
        let files = self.collect_files()?;
        let total = files.len();
        info!(
            "Processing {} files under '{}'",
            total,
            self.input_root.display()
        );
        if let Some(cb) = &self.options.progress {
            cb.on_batch_start(total);
        }

        let mut results = Vec::with_capacity(total);
        for (index, (abs, rel)) in files.iter().enumerate() {
            results.push(self.visit_file(abs, rel, index, total));
        }

        let finished_at = Utc::now();
        let stats = BatchStats::from_results(&results, started_at, finished_at);
        if let Some(cb) = &self.options.progress {
            cb.on_batch_complete(total, stats.succeeded);
        }

        std::fs::create_dir_all(&self.output_root).map_err(|source| {
            ProcessorError::ArtifactWriteFailed {
                path: self.output_root.clone(),
                source,
            }
        })?;

        let combined_path = if self.options.create_combined_file {
            let path = self.combined_artifact_path();
            self.write_artifact(&path, &report::assemble_combined(&results))?;
            info!("Wrote combined file: {}", path.display());
            Some(path)
        } else {
            None
        };

        let json_path = if self.options.json_enabled {
            let artifact = report::build_json_artifact(
                &results,
                &stats,
                &self.input_root.display().to_string(),
                self.options.include_content_in_json,
            );
            let json = serde_json::to_string_pretty(&artifact)
                .map_err(|e| ProcessorError::ArtifactWriteFailed {
                    path: self.json_artifact_path(),
                    source: std::io::Error::other(e),
                })?;
            let path = self.json_artifact_path();
            self.write_artifact(&path, &json)?;
            info!("Wrote JSON metadata: {}", path.display());
            Some(path)
        } else {
            None
        };

        let summary_path = {
            let path = self.summary_artifact_path();
            self.write_artifact(&path, &report::render_summary(&results, &stats))?;
            debug!("Wrote summary: {}", path.display());
            Some(path)
        };

        info!(
            "Batch complete: {} succeeded, {} failed, {} skipped",
            stats.succeeded, stats.failed, stats.skipped
        );

        Ok(BatchReport {
            results,
            stats,
            output_root: self.output_root.clone(),
            json_path,
            combined_path,
            summary_path,
        })
    }

    /// Enumerate all files under the input root in the stable traversal
    /// order: pure lexicographic by POSIX-style relative path.
    fn collect_files(&self) -> Result<Vec<(PathBuf, String)>, ProcessorError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.input_root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                // An unreadable root is fatal; an unreadable subtree is a
                // per-subtree problem the rest of the batch survives.
                Err(e) if e.depth() == 0 => {
                    return Err(ProcessorError::WalkFailed {
                        path: self.input_root.clone(),
                        detail: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = posix_relative(entry.path(), &self.input_root);
            files.push((entry.into_path(), rel));
        }
        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }

    // ── Per-file pipeline ────────────────────────────────────────────────

    /// Visit one file: skip policy, then convert → sanitize → write.
    /// Never returns an error; every outcome is a [`DocumentResult`].
    fn visit_file(&self, abs: &Path, rel: &str, index: usize, total: usize) -> DocumentResult {
        if let Some(reason) = self.skip_reason_for(abs, rel) {
            return match reason {
                Ok(reason) => {
                    info!("Skipping ({reason}): {rel}");
                    if let Some(cb) = &self.options.progress {
                        cb.on_file_skipped(index, total, rel, &reason.to_string());
                    }
                    DocumentResult::skipped(rel, reason)
                }
                Err(error) => {
                    warn!("{error}");
                    if let Some(cb) = &self.options.progress {
                        cb.on_file_error(index, total, rel, &error.to_string());
                    }
                    DocumentResult::failed(rel, error)
                }
            };
        }

        info!("Processing: {rel}");
        if let Some(cb) = &self.options.progress {
            cb.on_file_start(index, total, rel);
        }

        let extraction = match self.extractor.extract(abs) {
            Ok(extraction) => extraction,
            Err(e) => {
                let error = FileError::ConversionFailed {
                    path: rel.to_string(),
                    detail: e.to_string(),
                };
                warn!("{error}");
                if let Some(cb) = &self.options.progress {
                    cb.on_file_error(index, total, rel, &error.to_string());
                }
                return DocumentResult::failed(rel, error);
            }
        };

        let (sanitized, stats) = sanitize_and_measure(&extraction.text);
        debug!(
            "Sanitized {rel}: {} chars, {} words, ~{} tokens",
            stats.char_count, stats.word_count, stats.estimated_tokens
        );

        let out_file = self.output_path_for(rel);
        if let Err(error) = self.write_document(&out_file, rel, &extraction.method, &sanitized, stats)
        {
            warn!("{error}");
            if let Some(cb) = &self.options.progress {
                cb.on_file_error(index, total, rel, &error.to_string());
            }
            return DocumentResult::failed(rel, error);
        }

        if let Some(cb) = &self.options.progress {
            cb.on_file_complete(index, total, rel, stats.estimated_tokens);
        }
        DocumentResult::succeeded(rel, extraction.text, sanitized, stats, extraction.method)
    }

    /// Decide whether a file is excluded by policy before conversion.
    ///
    /// `Some(Ok(reason))` — skip with the reason; `Some(Err(e))` — the file
    /// could not even be stat'ed; `None` — proceed to conversion.
    fn skip_reason_for(&self, abs: &Path, rel: &str) -> Option<Result<SkipReason, FileError>> {
        let file_name = rel.rsplit('/').next().unwrap_or(rel);

        if self.options.skip_hidden_files && file_name.starts_with('.') {
            return Some(Ok(SkipReason::Hidden));
        }
        if self.options.skip_temp_files && is_temp_name(file_name) {
            return Some(Ok(SkipReason::TempFile));
        }
        if !self.options.supports_extension(&dotted_extension(file_name)) {
            return Some(Ok(SkipReason::UnsupportedFormat));
        }
        match file_size_mb(abs) {
            Err(e) => Some(Err(FileError::ReadFailed {
                path: rel.to_string(),
                detail: e.to_string(),
            })),
            Ok(mb) if mb > self.options.max_file_size_mb => {
                debug!("'{rel}' is {mb:.1} MB, cap is {} MB", self.options.max_file_size_mb);
                Some(Ok(SkipReason::TooLarge))
            }
            Ok(_) => None,
        }
    }

    /// Write one per-file output, creating parent directories as needed.
    fn write_document(
        &self,
        out_file: &Path,
        rel: &str,
        method: &str,
        sanitized: &str,
        stats: TextStats,
    ) -> Result<(), FileError> {
        let write_failed = |e: std::io::Error| FileError::WriteFailed {
            path: rel.to_string(),
            detail: e.to_string(),
        };
        if let Some(parent) = out_file.parent() {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
        }
        let content = if self.options.include_metadata_header {
            format!("{}{}", metadata_header(rel, method, stats), sanitized)
        } else {
            sanitized.to_string()
        };
        std::fs::write(out_file, content).map_err(write_failed)
    }

    /// Mirror the input's relative structure under the output root, with the
    /// extension swapped to `.md`.
    fn output_path_for(&self, rel: &str) -> PathBuf {
        let mut path = self.output_root.clone();
        path.extend(rel.split('/'));
        path.set_extension("md");
        path
    }

    fn output_base_name(&self) -> String {
        self.output_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string())
    }

    fn json_artifact_path(&self) -> PathBuf {
        self.output_root.join(format!("{}.json", self.output_base_name()))
    }

    fn combined_artifact_path(&self) -> PathBuf {
        let input_base = self
            .input_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        self.output_root.join(format!("combined-{input_base}.md"))
    }

    fn summary_artifact_path(&self) -> PathBuf {
        self.output_root
            .join(format!("{}-summary.txt", self.output_base_name()))
    }

    fn write_artifact(&self, path: &Path, content: &str) -> Result<(), ProcessorError> {
        std::fs::write(path, content).map_err(|source| ProcessorError::ArtifactWriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ── Path helpers ─────────────────────────────────────────────────────────────

/// `/`-joined path of `path` relative to `root`.
fn posix_relative(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Lowercase dot-prefixed extension of a file name, or empty string.
fn dotted_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Office lock files, `.tmp` scratch files, and OS junk.
fn is_temp_name(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    file_name.starts_with("~$") || lower.ends_with(".tmp") || JUNK_FILE_NAMES.contains(&lower.as_str())
}

/// File size in megabytes.
fn file_size_mb(path: &Path) -> Result<f64, std::io::Error> {
    Ok(std::fs::metadata(path)?.len() as f64 / (1024.0 * 1024.0))
}

/// YAML front-matter prepended to per-file outputs when
/// `include_metadata_header` is set. Never part of the combined file or the
/// JSON content field.
fn metadata_header(rel: &str, method: &str, stats: TextStats) -> String {
    format!(
        "---\nsource: {rel}\nextraction_method: {method}\nchar_count: {}\nword_count: {}\nestimated_tokens: {}\n---\n\n",
        stats.char_count, stats.word_count, stats.estimated_tokens
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PlainTextExtractor;

    #[test]
    fn posix_relative_joins_with_forward_slashes() {
        let root = Path::new("/data/input");
        let nested = Path::new("/data/input/reports/2024/q3.pdf");
        assert_eq!(posix_relative(nested, root), "reports/2024/q3.pdf");
        assert_eq!(posix_relative(Path::new("/data/input/a.txt"), root), "a.txt");
    }

    #[test]
    fn dotted_extension_is_lowercased() {
        assert_eq!(dotted_extension("Report.PDF"), ".pdf");
        assert_eq!(dotted_extension("notes.txt"), ".txt");
        assert_eq!(dotted_extension("archive.tar.gz"), ".gz");
        assert_eq!(dotted_extension("no_extension"), "");
        assert_eq!(dotted_extension(".bashrc"), "");
    }

    #[test]
    fn temp_name_detection() {
        assert!(is_temp_name("~$budget.xlsx"));
        assert!(is_temp_name("scratch.TMP"));
        assert!(is_temp_name("Thumbs.db"));
        assert!(is_temp_name(".DS_Store"));
        assert!(!is_temp_name("report.pdf"));
        assert!(!is_temp_name("template.docx"));
    }

    #[test]
    fn output_path_mirrors_structure_with_md_extension() {
        let processor = BatchProcessor::new(
            "/in",
            "/out",
            ProcessingOptions::default(),
            Arc::new(PlainTextExtractor::new()),
        )
        .unwrap();
        assert_eq!(
            processor.output_path_for("sub/dir/doc.txt"),
            PathBuf::from("/out/sub/dir/doc.md")
        );
        assert_eq!(processor.output_path_for("a.md"), PathBuf::from("/out/a.md"));
    }

    #[test]
    fn equal_input_output_rejected() {
        let err = BatchProcessor::new(
            "/same",
            "/same",
            ProcessingOptions::default(),
            Arc::new(PlainTextExtractor::new()),
        )
        .unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidOutputLocation { .. }));
    }

    #[test]
    fn output_inside_input_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = BatchProcessor::new(
            dir.path(),
            dir.path().join("out"),
            ProcessingOptions::default(),
            Arc::new(PlainTextExtractor::new()),
        )
        .unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidOutputLocation { .. }));
    }

    #[test]
    fn missing_input_is_fatal() {
        let processor = BatchProcessor::new(
            "/definitely/not/here",
            "/tmp/docs2md-out",
            ProcessingOptions::default(),
            Arc::new(PlainTextExtractor::new()),
        )
        .unwrap();
        let err = processor.run().unwrap_err();
        assert!(matches!(err, ProcessorError::InputNotFound { .. }));
    }

    #[test]
    fn metadata_header_shape() {
        let header = metadata_header(
            "a.txt",
            "plain_text",
            TextStats {
                char_count: 10,
                word_count: 2,
                estimated_tokens: 3,
            },
        );
        assert!(header.starts_with("---\n"));
        assert!(header.contains("source: a.txt"));
        assert!(header.contains("estimated_tokens: 3"));
        assert!(header.ends_with("---\n\n"));
    }
}
