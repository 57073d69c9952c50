//! The conversion-collaborator seam.
//!
//! Format parsing is not this crate's job. Everything that understands PDF
//! layout, OOXML, or spreadsheet cells lives behind the [`Extractor`] trait:
//! one method mapping a file path to extracted raw text. The orchestrator
//! calls it once per accepted file and treats any failure as a per-file
//! conversion error, which keeps the batch logic testable with a
//! deterministic fake instead of a real multi-format parser.

use std::path::Path;
use thiserror::Error;

/// Error raised by an [`Extractor`] implementation.
///
/// Mapped by the orchestrator to
/// [`crate::error::FileError::ConversionFailed`]; intentionally a single
/// message-carrying shape so implementations over arbitrary backends don't
/// have to fit a taxonomy they don't share.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ExtractError(pub String);

impl ExtractError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

/// Raw text extracted from one document.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Extracted markdown/text, unsanitized.
    pub text: String,
    /// Tag identifying how the text was produced (e.g. `"plain_text"`),
    /// surfaced in the JSON metadata artifact.
    pub method: String,
}

/// Converts one document file into raw markdown/text.
///
/// Implementations are expected to be polymorphic over input formats; the
/// orchestrator never inspects the file content itself, it only routes by
/// extension and size before calling this.
pub trait Extractor: Send + Sync {
    /// Extract raw text from the file at `path`.
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractError>;

    /// Short name for logs and metadata.
    fn name(&self) -> &str;
}

/// Extensions [`PlainTextExtractor`] reads verbatim.
const TEXT_EXTENSIONS: &[&str] = &[".txt", ".md", ".csv", ".tsv", ".html", ".htm", ".xml"];

/// Built-in extractor for formats that already are UTF-8 text.
///
/// It reads the file verbatim and refuses everything else, so the crate is
/// usable and testable without pulling in a document parser. Deployments
/// that need PDF/Office support inject a full converter behind the same
/// trait.
#[derive(Debug, Default, Clone)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn dotted_extension(path: &Path) -> String {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default()
    }
}

impl Extractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractError> {
        let ext = Self::dotted_extension(path);
        if !TEXT_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ExtractError::new(format!(
                "'{}' is not a plain-text format; no converter is configured for it",
                ext
            )));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ExtractError::new(format!("failed to read file: {e}")))?;
        Ok(Extraction {
            text,
            method: self.name().to_string(),
        })
    }

    fn name(&self) -> &str {
        "plain_text"
    }
}
