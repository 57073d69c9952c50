//! Batch artifacts: combined markdown, JSON metadata, and the text summary.
//!
//! Everything here is assembly over an already-finished result collection —
//! no I/O, no mutation. The orchestrator decides *whether* and *where* to
//! write each artifact; this module only decides *what* they contain, which
//! keeps the exact output formats unit-testable as plain strings and values.
//!
//! All three artifacts iterate the results in the orchestrator's stable
//! traversal order, so combined-output blocks, JSON document order, and the
//! per-file write order always agree.

use crate::output::{BatchStats, DocumentResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed extension → document-type map used in the JSON artifact.
///
/// Unknown extensions fall back to `"document"`.
pub fn document_type_for(extension: &str) -> &'static str {
    match extension {
        ".pdf" | ".docx" | ".doc" | ".rtf" | ".odt" | ".epub" => "document",
        ".pptx" | ".ppt" => "presentation",
        ".xlsx" | ".xls" | ".xlsb" => "spreadsheet",
        ".html" | ".htm" => "webpage",
        ".xml" => "markup",
        ".md" => "markdown",
        ".txt" => "text",
        ".csv" | ".tsv" => "data",
        _ => "document",
    }
}

/// Category for a document: its topmost path segment, or `"root"` for
/// top-level files. Lowercased, spaces replaced with underscores so the
/// value is usable as a grouping key downstream.
pub fn category_for(relative_path: &str) -> String {
    match relative_path.split('/').next() {
        Some(first) if relative_path.contains('/') => first.to_lowercase().replace(' ', "_"),
        _ => "root".to_string(),
    }
}

// ── Combined markdown ────────────────────────────────────────────────────────

/// Assemble the combined markdown document from the succeeded results.
///
/// Each block is `# <relative_path>` followed by the sanitized content;
/// blocks are joined by a horizontal rule, with no trailing separator after
/// the last block and a single final newline. Failed and skipped files are
/// excluded here but still counted in [`BatchStats`].
pub fn assemble_combined(results: &[DocumentResult]) -> String {
    let blocks: Vec<String> = results
        .iter()
        .filter(|r| r.is_succeeded())
        .map(|r| {
            format!(
                "# {}\n\n{}",
                r.relative_path,
                r.sanitized_text.as_deref().unwrap_or_default()
            )
        })
        .collect();
    if blocks.is_empty() {
        return String::new();
    }
    format!("{}\n", blocks.join("\n\n---\n\n"))
}

// ── JSON metadata ────────────────────────────────────────────────────────────

/// Top-level shape of the JSON metadata artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonArtifact {
    pub extraction_info: ExtractionInfo,
    pub documents: Vec<DocumentEntry>,
}

/// Batch-level block of the JSON artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionInfo {
    pub total_documents: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source_directory: String,
    /// Extraction-method tag → number of documents produced with it.
    pub extraction_methods: BTreeMap<String, usize>,
    pub total_chars: usize,
    pub total_words: usize,
    pub estimated_tokens: usize,
}

/// One succeeded document in the JSON artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Stable `doc_001`-style identifier in traversal order.
    pub id: String,
    pub filename: String,
    pub relative_path: String,
    pub document_type: String,
    pub category: String,
    /// Full sanitized text; present only when content inclusion was
    /// requested (it duplicates the whole corpus into one file).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub metadata: DocumentEntryMetadata,
}

/// Per-document counters in the JSON artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntryMetadata {
    pub extraction_method: String,
    pub word_count: usize,
    pub char_count: usize,
    pub estimated_tokens: usize,
}

/// Build the JSON artifact value for a finished batch.
///
/// Only succeeded documents get a `documents` entry; failures and skips are
/// visible through the `extraction_info` counters (and in each
/// [`DocumentResult`] for callers using the library directly).
pub fn build_json_artifact(
    results: &[DocumentResult],
    stats: &BatchStats,
    source_directory: &str,
    include_content: bool,
) -> JsonArtifact {
    let mut extraction_methods: BTreeMap<String, usize> = BTreeMap::new();
    let mut documents = Vec::new();

    for result in results.iter().filter(|r| r.is_succeeded()) {
        let method = result
            .extraction_method
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        *extraction_methods.entry(method.clone()).or_insert(0) += 1;

        let filename = result
            .relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&result.relative_path)
            .to_string();
        let extension = filename
            .rfind('.')
            .map(|i| filename[i..].to_lowercase())
            .unwrap_or_default();

        let id = format!("doc_{:03}", documents.len() + 1);
        documents.push(DocumentEntry {
            id,
            document_type: document_type_for(&extension).to_string(),
            category: category_for(&result.relative_path),
            relative_path: result.relative_path.clone(),
            filename,
            content: include_content.then(|| {
                result.sanitized_text.clone().unwrap_or_default()
            }),
            metadata: DocumentEntryMetadata {
                extraction_method: method,
                word_count: result.word_count,
                char_count: result.char_count,
                estimated_tokens: result.estimated_tokens,
            },
        });
    }

    JsonArtifact {
        extraction_info: ExtractionInfo {
            total_documents: documents.len(),
            succeeded: stats.succeeded,
            failed: stats.failed,
            skipped: stats.skipped,
            started_at: stats.started_at,
            finished_at: stats.finished_at,
            source_directory: source_directory.to_string(),
            extraction_methods,
            total_chars: stats.total_chars,
            total_words: stats.total_words,
            estimated_tokens: stats.total_tokens,
        },
        documents,
    }
}

// ── Text summary ─────────────────────────────────────────────────────────────

/// Render the human-readable run summary: batch totals followed by a
/// per-file token breakdown sorted by token count, largest first, so the
/// documents dominating the context budget are at the top.
pub fn render_summary(results: &[DocumentResult], stats: &BatchStats) -> String {
    let mut out = String::new();
    out.push_str("Extraction Summary\n");
    out.push_str(&"=".repeat(72));
    out.push_str("\n\n");

    out.push_str("Text Statistics:\n");
    out.push_str(&format!("  Total characters: {}\n", stats.total_chars));
    out.push_str(&format!("  Total words: {}\n", stats.total_words));
    out.push_str(&format!(
        "  Estimated LLM tokens: {} (1 token ~= 4 characters)\n\n",
        stats.total_tokens
    ));

    out.push_str("Files:\n");
    out.push_str(&format!("  Total files visited: {}\n", stats.total_visited()));
    out.push_str(&format!("  Successfully processed: {}\n", stats.succeeded));
    out.push_str(&format!("  Failed to process: {}\n", stats.failed));
    out.push_str(&format!("  Skipped: {}\n\n", stats.skipped));

    let mut succeeded: Vec<&DocumentResult> =
        results.iter().filter(|r| r.is_succeeded()).collect();
    succeeded.sort_by(|a, b| {
        b.estimated_tokens
            .cmp(&a.estimated_tokens)
            .then_with(|| a.relative_path.cmp(&b.relative_path))
    });

    if !succeeded.is_empty() {
        out.push_str(&"=".repeat(72));
        out.push_str("\nPer-File Token Breakdown\n");
        out.push_str(&"=".repeat(72));
        out.push_str("\n\n");
        out.push_str(&format!(
            "{:<44} {:>8} {:>8} {:>10}\n",
            "File", "Tokens", "Words", "Chars"
        ));
        out.push_str(&"-".repeat(72));
        out.push('\n');

        for result in succeeded {
            let mut name = result.relative_path.clone();
            if name.chars().count() > 42 {
                let tail: String = name
                    .chars()
                    .rev()
                    .take(39)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                name = format!("...{tail}");
            }
            out.push_str(&format!(
                "{:<44} {:>8} {:>8} {:>10}\n",
                name, result.estimated_tokens, result.word_count, result.char_count
            ));
        }
    }

    out
}
