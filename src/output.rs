//! Result types: per-document outcomes and batch-level aggregates.
//!
//! A [`DocumentResult`] is created for every file the orchestrator visits
//! and is immutable once populated — exactly one of the three constructors
//! applies, and the status decides which optional fields are present.
//! [`BatchStats`] is always *derived* from the result collection rather than
//! mutated alongside it, so the two can never disagree.

use crate::error::{FileError, SkipReason};
use crate::sanitize::TextStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of visiting one file.
///
/// `Skipped` means policy excluded the file before conversion was attempted;
/// `Failed` means conversion or output I/O was attempted and raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// One visited file's outcome, including its text and statistics on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// POSIX-style path (`/`-separated) relative to the input root. For a
    /// single-file run this is just the file name.
    pub relative_path: String,

    pub status: DocumentStatus,

    /// Text as returned by the extractor, before sanitization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,

    /// Sanitized markdown; what lands in the per-file output and the
    /// combined document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitized_text: Option<String>,

    /// Unicode scalar count of the sanitized text. Zero unless succeeded.
    pub char_count: usize,

    /// Whitespace-delimited token count of the sanitized text.
    pub word_count: usize,

    /// `round(char_count / 4)` of the sanitized text.
    pub estimated_tokens: usize,

    /// How the raw text was produced. Present only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<String>,

    /// Present only when `status == Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileError>,

    /// Present only when `status == Skipped`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
}

impl DocumentResult {
    /// A successfully converted, sanitized, and written document.
    pub fn succeeded(
        relative_path: impl Into<String>,
        raw_text: String,
        sanitized_text: String,
        stats: TextStats,
        extraction_method: impl Into<String>,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            status: DocumentStatus::Succeeded,
            raw_text: Some(raw_text),
            sanitized_text: Some(sanitized_text),
            char_count: stats.char_count,
            word_count: stats.word_count,
            estimated_tokens: stats.estimated_tokens,
            extraction_method: Some(extraction_method.into()),
            error: None,
            skip_reason: None,
        }
    }

    /// Conversion or output I/O was attempted and raised.
    pub fn failed(relative_path: impl Into<String>, error: FileError) -> Self {
        Self {
            relative_path: relative_path.into(),
            status: DocumentStatus::Failed,
            raw_text: None,
            sanitized_text: None,
            char_count: 0,
            word_count: 0,
            estimated_tokens: 0,
            extraction_method: None,
            error: Some(error),
            skip_reason: None,
        }
    }

    /// Excluded by policy before conversion was attempted.
    pub fn skipped(relative_path: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            relative_path: relative_path.into(),
            status: DocumentStatus::Skipped,
            raw_text: None,
            sanitized_text: None,
            char_count: 0,
            word_count: 0,
            estimated_tokens: 0,
            extraction_method: None,
            error: None,
            skip_reason: Some(reason),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == DocumentStatus::Succeeded
    }
}

/// Aggregate statistics over one batch run.
///
/// Derived from the result collection via [`BatchStats::from_results`];
/// never mutated independently, so `succeeded + failed + skipped` always
/// equals the number of files visited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_chars: usize,
    pub total_words: usize,
    pub total_tokens: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchStats {
    /// Recompute the aggregate from a result collection.
    pub fn from_results(
        results: &[DocumentResult],
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let mut stats = Self {
            succeeded: 0,
            failed: 0,
            skipped: 0,
            total_chars: 0,
            total_words: 0,
            total_tokens: 0,
            started_at,
            finished_at,
        };
        for result in results {
            match result.status {
                DocumentStatus::Succeeded => stats.succeeded += 1,
                DocumentStatus::Failed => stats.failed += 1,
                DocumentStatus::Skipped => stats.skipped += 1,
            }
            stats.total_chars += result.char_count;
            stats.total_words += result.word_count;
            stats.total_tokens += result.estimated_tokens;
        }
        stats
    }

    /// Files visited: `succeeded + failed + skipped`.
    pub fn total_visited(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}

/// Everything a batch run produced: the ordered results, the aggregate
/// statistics, and the paths of any artifacts written.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One entry per visited file, in stable traversal order.
    pub results: Vec<DocumentResult>,
    pub stats: BatchStats,
    /// Root directory the per-file outputs were written under.
    pub output_root: PathBuf,
    /// JSON metadata artifact, when enabled and in directory mode.
    pub json_path: Option<PathBuf>,
    /// Combined markdown artifact, when enabled and in directory mode.
    pub combined_path: Option<PathBuf>,
    /// Text summary artifact, when in directory mode.
    pub summary_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::TextStats;

    fn sample_success(path: &str, chars: usize) -> DocumentResult {
        DocumentResult::succeeded(
            path,
            "raw".into(),
            "clean".into(),
            TextStats {
                char_count: chars,
                word_count: chars / 5,
                estimated_tokens: chars / 4,
            },
            "plain_text",
        )
    }

    #[test]
    fn constructors_set_exactly_one_detail_field() {
        let ok = sample_success("a.txt", 100);
        assert!(ok.is_succeeded());
        assert!(ok.sanitized_text.is_some());
        assert!(ok.error.is_none() && ok.skip_reason.is_none());

        let failed = DocumentResult::failed(
            "b.pdf",
            FileError::ConversionFailed {
                path: "b.pdf".into(),
                detail: "boom".into(),
            },
        );
        assert_eq!(failed.status, DocumentStatus::Failed);
        assert!(failed.raw_text.is_none() && failed.sanitized_text.is_none());
        assert!(failed.error.is_some());
        assert_eq!(failed.estimated_tokens, 0);

        let skipped = DocumentResult::skipped("c.bad", SkipReason::UnsupportedFormat);
        assert_eq!(skipped.status, DocumentStatus::Skipped);
        assert_eq!(skipped.skip_reason, Some(SkipReason::UnsupportedFormat));
        assert!(skipped.error.is_none());
    }

    #[test]
    fn stats_derived_from_results() {
        let now = Utc::now();
        let results = vec![
            sample_success("a.txt", 100),
            sample_success("b/c.md", 200),
            DocumentResult::failed(
                "d.pdf",
                FileError::ConversionFailed {
                    path: "d.pdf".into(),
                    detail: "boom".into(),
                },
            ),
            DocumentResult::skipped("e.exe", SkipReason::UnsupportedFormat),
        ];
        let stats = BatchStats::from_results(&results, now, now);

        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.total_visited(), results.len());
        assert_eq!(stats.total_chars, 300);
        assert_eq!(stats.total_tokens, 75);
    }

    #[test]
    fn empty_batch_has_zero_stats() {
        let now = Utc::now();
        let stats = BatchStats::from_results(&[], now, now);
        assert_eq!(stats.total_visited(), 0);
        assert_eq!(stats.total_tokens, 0);
    }

    #[test]
    fn failed_result_serializes_without_text_fields() {
        let failed = DocumentResult::failed(
            "x.pdf",
            FileError::WriteFailed {
                path: "x.pdf".into(),
                detail: "disk full".into(),
            },
        );
        let json = serde_json::to_value(&failed).unwrap();
        assert!(json.get("raw_text").is_none());
        assert!(json.get("sanitized_text").is_none());
        assert_eq!(json["status"], "failed");
    }
}
