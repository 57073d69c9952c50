//! Configuration types for batch document processing.
//!
//! All processing behaviour is controlled through [`ProcessingOptions`],
//! built via [`ProcessingOptionsBuilder`] or loaded from a YAML file.
//! Keeping every knob in one immutable value makes it trivial to pass the
//! same options through the whole run, serialise them for logging, and diff
//! two runs to understand why their outputs differ. Options are constructed
//! once and never mutated afterwards, so repeated runs with different
//! settings cannot interfere through ambient state.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field. The
//! builder lets callers set only what they care about and rely on documented
//! defaults for the rest; `build()` is where validation lives.

use crate::error::ProcessorError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Extensions handled out of the box, matching what mainstream conversion
/// libraries accept. Lowercase, dot-prefixed.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".pdf", ".docx", ".doc", ".pptx", ".ppt", ".xlsx", ".xls", ".xlsb", ".txt", ".html", ".htm",
    ".xml", ".csv", ".tsv", ".md", ".rtf", ".odt", ".epub", ".zip",
];

/// Options for a batch processing run.
///
/// Built via [`ProcessingOptions::builder()`], [`ProcessingOptions::default()`],
/// or [`ProcessingOptions::from_yaml_file()`].
///
/// # Example
/// ```rust
/// use docs2md::ProcessingOptions;
///
/// let options = ProcessingOptions::builder()
///     .max_file_size_mb(25.0)
///     .json_enabled(false)
///     .build()
///     .unwrap();
/// assert!(options.skip_hidden_files);
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// Skip files whose name starts with a dot. Default: true.
    pub skip_hidden_files: bool,

    /// Skip editor/OS temp and junk files (`~$…`, `*.tmp`, `Thumbs.db`,
    /// `.DS_Store`, `desktop.ini`). Default: true.
    pub skip_temp_files: bool,

    /// Maximum input file size in megabytes. Default: 100.0.
    ///
    /// Conversion libraries hold whole documents in memory; a stray multi-GB
    /// archive would otherwise stall the batch for everyone behind it.
    pub max_file_size_mb: f64,

    /// File extensions accepted for conversion (lowercase, dot-prefixed).
    /// A `BTreeSet` so serialised configs and log output list them in one
    /// stable order.
    pub supported_extensions: BTreeSet<String>,

    /// Prepend a YAML front-matter block (source path, extraction method,
    /// counts) to every per-file output. Default: true.
    ///
    /// The combined file and the JSON `content` field never include this
    /// header, so counts stay header-independent.
    pub include_metadata_header: bool,

    /// Write one combined markdown document for the whole batch
    /// (directory mode only). Default: true.
    pub create_combined_file: bool,

    /// Include each document's full sanitized text in the JSON metadata
    /// artifact. Default: false.
    ///
    /// This duplicates the entire corpus inside one JSON file and is a
    /// deliberate memory/disk trade-off for pipelines that want a single
    /// artifact to ship; leave it off otherwise.
    pub include_content_in_json: bool,

    /// Write the JSON metadata artifact (directory mode only). Default: true.
    pub json_enabled: bool,

    /// Progress callback invoked at batch and file boundaries.
    /// Not part of the serialised configuration.
    #[serde(skip)]
    pub progress: Option<ProgressCallback>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            skip_hidden_files: true,
            skip_temp_files: true,
            max_file_size_mb: 100.0,
            supported_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            include_metadata_header: true,
            create_combined_file: true,
            include_content_in_json: false,
            json_enabled: true,
            progress: None,
        }
    }
}

impl fmt::Debug for ProcessingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingOptions")
            .field("skip_hidden_files", &self.skip_hidden_files)
            .field("skip_temp_files", &self.skip_temp_files)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("supported_extensions", &self.supported_extensions)
            .field("include_metadata_header", &self.include_metadata_header)
            .field("create_combined_file", &self.create_combined_file)
            .field("include_content_in_json", &self.include_content_in_json)
            .field("json_enabled", &self.json_enabled)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn callback>"))
            .finish()
    }
}

impl ProcessingOptions {
    /// Create a new builder seeded with the defaults.
    pub fn builder() -> ProcessingOptionsBuilder {
        ProcessingOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Load options from a YAML file, validating the result.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ProcessorError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ProcessorError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let options: Self =
            serde_yaml::from_str(&raw).map_err(|e| ProcessorError::ConfigParse {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        options.validate()?;
        Ok(options)
    }

    /// Save options as YAML, e.g. for `--generate-config`.
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<(), ProcessorError> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| ProcessorError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, yaml).map_err(|source| ProcessorError::ArtifactWriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether a dot-prefixed lowercase extension is accepted.
    pub fn supports_extension(&self, ext: &str) -> bool {
        self.supported_extensions.contains(ext)
    }

    fn validate(&self) -> Result<(), ProcessorError> {
        if !(self.max_file_size_mb > 0.0) {
            return Err(ProcessorError::InvalidConfig(format!(
                "max_file_size_mb must be a positive number, got {}",
                self.max_file_size_mb
            )));
        }
        for ext in &self.supported_extensions {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(ProcessorError::InvalidConfig(format!(
                    "supported extension '{ext}' must be dot-prefixed, e.g. '.pdf'"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`ProcessingOptions`].
#[derive(Debug)]
pub struct ProcessingOptionsBuilder {
    options: ProcessingOptions,
}

impl ProcessingOptionsBuilder {
    pub fn skip_hidden_files(mut self, v: bool) -> Self {
        self.options.skip_hidden_files = v;
        self
    }

    pub fn skip_temp_files(mut self, v: bool) -> Self {
        self.options.skip_temp_files = v;
        self
    }

    pub fn max_file_size_mb(mut self, mb: f64) -> Self {
        self.options.max_file_size_mb = mb;
        self
    }

    /// Replace the supported-extension set. Entries are lowercased; a
    /// missing leading dot is added.
    pub fn supported_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.options.supported_extensions = extensions
            .into_iter()
            .map(|e| {
                let e = e.as_ref().to_lowercase();
                if e.starts_with('.') {
                    e
                } else {
                    format!(".{e}")
                }
            })
            .collect();
        self
    }

    pub fn include_metadata_header(mut self, v: bool) -> Self {
        self.options.include_metadata_header = v;
        self
    }

    pub fn create_combined_file(mut self, v: bool) -> Self {
        self.options.create_combined_file = v;
        self
    }

    pub fn include_content_in_json(mut self, v: bool) -> Self {
        self.options.include_content_in_json = v;
        self
    }

    pub fn json_enabled(mut self, v: bool) -> Self {
        self.options.json_enabled = v;
        self
    }

    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.options.progress = Some(callback);
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<ProcessingOptions, ProcessorError> {
        self.options.validate()?;
        Ok(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let o = ProcessingOptions::default();
        assert!(o.skip_hidden_files);
        assert!(o.skip_temp_files);
        assert_eq!(o.max_file_size_mb, 100.0);
        assert!(o.supports_extension(".pdf"));
        assert!(o.supports_extension(".txt"));
        assert!(!o.supports_extension(".exe"));
        assert!(o.include_metadata_header);
        assert!(o.create_combined_file);
        assert!(!o.include_content_in_json);
        assert!(o.json_enabled);
    }

    #[test]
    fn builder_overrides_and_validates() {
        let o = ProcessingOptions::builder()
            .max_file_size_mb(5.0)
            .supported_extensions(["txt", ".MD"])
            .json_enabled(false)
            .build()
            .unwrap();
        assert_eq!(o.max_file_size_mb, 5.0);
        assert!(o.supports_extension(".txt"));
        assert!(o.supports_extension(".md"));
        assert!(!o.supports_extension(".pdf"));
        assert!(!o.json_enabled);
    }

    #[test]
    fn zero_size_cap_rejected() {
        let err = ProcessingOptions::builder()
            .max_file_size_mb(0.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_file_size_mb"));
    }

    #[test]
    fn negative_size_cap_rejected() {
        assert!(ProcessingOptions::builder()
            .max_file_size_mb(-1.0)
            .build()
            .is_err());
    }

    #[test]
    fn yaml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let original = ProcessingOptions::builder()
            .max_file_size_mb(42.0)
            .include_content_in_json(true)
            .build()
            .unwrap();
        original.to_yaml_file(&path).unwrap();

        let loaded = ProcessingOptions::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.max_file_size_mb, 42.0);
        assert!(loaded.include_content_in_json);
        assert_eq!(loaded.supported_extensions, original.supported_extensions);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.yaml");
        std::fs::write(&path, "max_file_size_mb: 10\n").unwrap();

        let loaded = ProcessingOptions::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.max_file_size_mb, 10.0);
        assert!(loaded.json_enabled);
        assert!(loaded.supports_extension(".pdf"));
    }

    #[test]
    fn invalid_yaml_value_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "max_file_size_mb: -3\n").unwrap();
        assert!(ProcessingOptions::from_yaml_file(&path).is_err());
    }

    #[test]
    fn missing_config_file_is_config_read_error() {
        let err = ProcessingOptions::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ProcessorError::ConfigRead { .. }));
    }
}
