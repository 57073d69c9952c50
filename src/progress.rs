//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn ProcessingProgressCallback>`] via
//! [`crate::config::ProcessingOptionsBuilder::progress`] to receive events
//! as the orchestrator visits each file.
//!
//! # Why callbacks instead of channels?
//!
//! The callback is the least-invasive integration point: callers can forward
//! events to a terminal progress bar, a log sink, or a database record
//! without the library knowing anything about how the host application
//! communicates. The batch is processed on a single thread, but the trait is
//! still `Send + Sync` so the same callback value can be shared with other
//! parts of the host application.
//!
//! # Example
//!
//! ```rust
//! use docs2md::{ProcessingOptions, ProcessingProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ProcessingProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, path: &str, tokens: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {} ({} tokens)", index + 1, total, path, tokens);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let options = ProcessingOptions::builder()
//!     .progress(counter as Arc<dyn ProcessingProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it visits each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is always the file's zero-based position in
/// the stable traversal order, `total` the number of files visited in the
/// whole run.
pub trait ProcessingProgressCallback: Send + Sync {
    /// Called once before any file is visited.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is converted.
    fn on_file_start(&self, index: usize, total: usize, path: &str) {
        let _ = (index, total, path);
    }

    /// Called when a file was converted, sanitized, and written.
    fn on_file_complete(&self, index: usize, total: usize, path: &str, tokens: usize) {
        let _ = (index, total, path, tokens);
    }

    /// Called when a file was excluded by policy before conversion.
    fn on_file_skipped(&self, index: usize, total: usize, path: &str, reason: &str) {
        let _ = (index, total, path, reason);
    }

    /// Called when conversion or output I/O failed for a file.
    /// The batch continues past the failure.
    fn on_file_error(&self, index: usize, total: usize, path: &str, error: &str) {
        let _ = (index, total, path, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, succeeded: usize) {
        let _ = (total_files, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ProcessingProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in
/// [`crate::config::ProcessingOptions`].
pub type ProgressCallback = Arc<dyn ProcessingProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        skips: AtomicUsize,
        errors: AtomicUsize,
        batch_total: AtomicUsize,
        batch_succeeded: AtomicUsize,
    }

    impl ProcessingProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_files: usize) {
            self.batch_total.store(total_files, Ordering::SeqCst);
        }

        fn on_file_start(&self, _index: usize, _total: usize, _path: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _total: usize, _path: &str, _tokens: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_skipped(&self, _index: usize, _total: usize, _path: &str, _reason: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_error(&self, _index: usize, _total: usize, _path: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total_files: usize, succeeded: usize) {
            self.batch_succeeded.store(succeeded, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(3);
        cb.on_file_start(0, 3, "a.txt");
        cb.on_file_complete(0, 3, "a.txt", 42);
        cb.on_file_skipped(1, 3, "b.tmp", "temporary file");
        cb.on_file_error(2, 3, "c.pdf", "parser failed");
        cb.on_batch_complete(3, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            skips: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            batch_total: AtomicUsize::new(0),
            batch_succeeded: AtomicUsize::new(0),
        };

        tracker.on_batch_start(3);
        tracker.on_file_start(0, 3, "a.txt");
        tracker.on_file_complete(0, 3, "a.txt", 10);
        tracker.on_file_skipped(1, 3, "b.tmp", "temporary file");
        tracker.on_file_start(2, 3, "c.pdf");
        tracker.on_file_error(2, 3, "c.pdf", "conversion failed");
        tracker.on_batch_complete(3, 1);

        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.batch_succeeded.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ProcessingProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_file_complete(0, 10, "doc.pdf", 512);
    }
}
