//! Progress-callback trait for per-unit translation events.
//!
//! Inject an [`Arc<dyn TranslationProgressCallback>`] via
//! [`crate::config::ReaderConfigBuilder::progress_callback`] to receive events
//! as the translation loop works through the units. The library itself never
//! prints; the CLI forwards these events to a terminal progress bar.
//!
//! # Example
//!
//! ```rust
//! use parallel_reader::{ReaderConfig, TranslationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl TranslationProgressCallback for CountingCallback {
//!     fn on_unit_complete(&self, index: usize, total: usize, chars: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Unit {}/{} done ({} chars)", index, total, chars);
//!     }
//! }
//!
//! let config = ReaderConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::RunStats;
use std::sync::Arc;
use std::time::Duration;

/// Called by the translation loop as it processes each unit.
///
/// Units are translated one at a time in index order, so events for one
/// unit never interleave with events for another. All methods have no-op
/// defaults so implementors only override what they care about.
pub trait TranslationProgressCallback: Send + Sync {
    /// Called once before the first request.
    fn on_run_start(&self, total_units: usize) {
        let _ = total_units;
    }

    /// Called just before the first request for a unit.
    fn on_unit_start(&self, index: usize, total_units: usize) {
        let _ = (index, total_units);
    }

    /// Called when a unit was translated.
    ///
    /// `chars` is the character count of the translation.
    fn on_unit_complete(&self, index: usize, total_units: usize, chars: usize) {
        let _ = (index, total_units, chars);
    }

    /// Called when a unit ends with a failure recorded in place of its translation.
    ///
    /// `error` is owned so implementations can move it into a log or channel.
    fn on_unit_error(&self, index: usize, total_units: usize, error: String) {
        let _ = (index, total_units, error);
    }

    /// Called before sleeping `delay` and retrying a unit after a transient failure.
    ///
    /// `attempt` is the 1-based number of the retry about to be made.
    fn on_retry(&self, index: usize, attempt: u32, delay: Duration) {
        let _ = (index, attempt, delay);
    }

    /// Called once after the loop ends, whether it completed or halted.
    fn on_run_complete(&self, stats: &RunStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TranslationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReaderConfig`].
pub type ProgressCallback = Arc<dyn TranslationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        retries: AtomicUsize,
    }

    impl TranslationProgressCallback for TrackingCallback {
        fn on_unit_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_unit_complete(&self, _index: usize, _total: usize, _chars: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_unit_error(&self, _index: usize, _total: usize, _error: String) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_retry(&self, _index: usize, _attempt: u32, _delay: Duration) {
            self.retries.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(5);
        cb.on_unit_start(1, 5);
        cb.on_unit_complete(1, 5, 42);
        cb.on_unit_error(2, 5, "some error".to_string());
        cb.on_retry(3, 1, Duration::from_secs(5));
        cb.on_run_complete(&RunStats::default());
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_unit_start(1, 2);
        tracker.on_unit_complete(1, 2, 10);
        tracker.on_unit_start(2, 2);
        tracker.on_retry(2, 1, Duration::from_millis(1));
        tracker.on_unit_error(2, 2, "HTTP 500".to_string());

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.retries.load(Ordering::SeqCst), 1);
    }
}
