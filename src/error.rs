//! Error types for the docs2md library.
//!
//! Three distinct types reflect three distinct outcomes:
//!
//! * [`ProcessorError`] — **Fatal**: the batch cannot proceed at all
//!   (missing root input, invalid configuration, a batch artifact such as
//!   the combined file could not be written). Returned as
//!   `Err(ProcessorError)` from [`crate::batch::BatchProcessor::run`].
//!
//! * [`FileError`] — **Non-fatal**: a single file failed (the external
//!   converter raised, or its output could not be written) but every other
//!   file is unaffected. Stored inside [`crate::output::DocumentResult`] so
//!   callers can inspect partial success rather than losing the whole batch
//!   to one bad document.
//!
//! * [`SkipReason`] — not an error at all: the file was excluded by policy
//!   before conversion was attempted (hidden, temp, unsupported extension,
//!   oversized). Recorded on the result so nothing is silently dropped.
//!
//! The separation is the crate's failure-isolation contract: per-file
//! problems are data on the result, never control flow that aborts siblings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docs2md library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::output::DocumentResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The root input path does not exist.
    #[error("Input path not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Input and output paths are the same, or the output directory is
    /// nested inside the input directory (processing would re-ingest its
    /// own output).
    #[error("Invalid output location '{output}': {detail}")]
    InvalidOutputLocation { output: PathBuf, detail: String },

    /// Builder or YAML validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not read the YAML configuration file.
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML configuration file did not parse.
    #[error("Failed to parse configuration file '{path}': {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    /// A batch-level artifact (combined file, JSON metadata, summary) could
    /// not be written. Per-file output failures are [`FileError::WriteFailed`]
    /// instead and do not abort the run.
    #[error("Failed to write batch artifact '{path}': {source}")]
    ArtifactWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input directory could not be walked at all.
    #[error("Failed to enumerate input directory '{path}': {detail}")]
    WalkFailed { path: PathBuf, detail: String },
}

/// A non-fatal error for a single file.
///
/// Stored on the file's [`crate::output::DocumentResult`] when conversion or
/// output I/O fails. The batch always continues past it.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum FileError {
    /// The external conversion collaborator failed on this file.
    #[error("Conversion failed for '{path}': {detail}")]
    ConversionFailed { path: String, detail: String },

    /// The file could not be read (stat or open failed mid-run).
    #[error("Failed to read '{path}': {detail}")]
    ReadFailed { path: String, detail: String },

    /// The per-file markdown output could not be written.
    #[error("Failed to write output for '{path}': {detail}")]
    WriteFailed { path: String, detail: String },
}

/// Why a file was excluded before conversion was attempted.
///
/// Skips are policy decisions, not failures: the distinction matters for
/// [`crate::output::BatchStats`] and is surfaced in the JSON metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// File name starts with a dot.
    Hidden,
    /// Editor/OS temp or junk file (`~$` prefix, `.tmp`, `Thumbs.db`, ...).
    TempFile,
    /// Extension not in the configured supported set.
    UnsupportedFormat,
    /// File size exceeds the configured cap.
    TooLarge,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::Hidden => "hidden file",
            SkipReason::TempFile => "temporary file",
            SkipReason::UnsupportedFormat => "unsupported format",
            SkipReason::TooLarge => "exceeds size limit",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_failed_display_names_file_and_stage() {
        let e = FileError::ConversionFailed {
            path: "reports/q3.pdf".into(),
            detail: "parser returned no content".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("reports/q3.pdf"), "got: {msg}");
        assert!(msg.contains("Conversion failed"), "got: {msg}");
    }

    #[test]
    fn write_failed_display() {
        let e = FileError::WriteFailed {
            path: "a.txt".into(),
            detail: "permission denied".into(),
        };
        assert!(e.to_string().contains("permission denied"));
    }

    #[test]
    fn skip_reason_serializes_snake_case() {
        let json = serde_json::to_string(&SkipReason::UnsupportedFormat).unwrap();
        assert_eq!(json, "\"unsupported_format\"");
    }

    #[test]
    fn input_not_found_display() {
        let e = ProcessorError::InputNotFound {
            path: PathBuf::from("/no/such/dir"),
        };
        assert!(e.to_string().contains("/no/such/dir"));
    }
}
