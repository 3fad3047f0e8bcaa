//! Translation loop: one backend call per unit, strictly in index order.
//!
//! ## Policy
//!
//! | Backend outcome              | Unit result                     | Loop       |
//! |------------------------------|---------------------------------|------------|
//! | `Ok(text)`                   | `Translated(text)`              | continue   |
//! | `Transient`                  | retry after `retry_backoff`     | same unit  |
//! | `Transient`, retries spent   | `Failed(Generic)`               | continue   |
//! | `InvalidResponse`            | `Failed(InvalidResponse)`       | continue   |
//! | `Http` / `Other`             | `Failed(Generic)`               | continue   |
//! | `QuotaExceeded`              | `Failed(QuotaExceeded)`         | **halt**   |
//!
//! After a halt the remaining units keep `Translation::Pending`, so the
//! unit list is never shortened and every original still gets a row.
//!
//! The only suspension points are the cooldown before every request but the
//! first, and the backoff before each retry.

use crate::backend::TranslationBackend;
use crate::config::ReaderConfig;
use crate::error::BackendError;
use crate::output::{HaltReason, RunStats, Translation, TranslationFailure, TranslationRun, Unit};
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Translate every unit in order and return them with their results.
pub async fn translate_units(
    backend: &dyn TranslationBackend,
    mut units: Vec<Unit>,
    config: &ReaderConfig,
) -> TranslationRun {
    let start = Instant::now();
    let total = units.len();
    let mut stats = RunStats::default();
    let mut halted = None;

    info!(
        "Translating {} units via {} ({} → {})",
        total,
        backend.name(),
        config.source_lang,
        config.target_lang
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    for (pos, unit) in units.iter_mut().enumerate() {
        if pos > 0 && !config.cooldown.is_zero() {
            sleep(config.cooldown).await;
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_unit_start(unit.index, total);
        }
        stats.characters += unit.original.chars().count();

        match translate_one(backend, unit, config, &mut stats).await {
            Ok(text) => {
                debug!("Unit {}: {} chars translated", unit.index, text.chars().count());
                if let Some(ref cb) = config.progress_callback {
                    cb.on_unit_complete(unit.index, total, text.chars().count());
                }
                unit.translation = Translation::Translated(text);
            }
            Err(err) => {
                let failure = TranslationFailure::from(&err);
                unit.translation = Translation::Failed(failure);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_unit_error(unit.index, total, err.to_string());
                }

                if let BackendError::QuotaExceeded { detail } = err {
                    warn!(
                        "Unit {}: quota exceeded, halting with {} units untranslated",
                        unit.index,
                        total - pos - 1
                    );
                    halted = Some(HaltReason::QuotaExceeded {
                        unit: unit.index,
                        detail,
                    });
                    break;
                }
                warn!("Unit {}: translation failed ({})", unit.index, err);
            }
        }
    }

    stats.tally(&units);
    stats.duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Translation done: {} translated, {} failed, {} not attempted, {} retries",
        stats.translated, stats.failed, stats.not_attempted, stats.retries
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(&stats);
    }

    TranslationRun {
        units,
        halted,
        stats,
    }
}

/// Drive one unit to a terminal outcome, retrying transient failures.
async fn translate_one(
    backend: &dyn TranslationBackend,
    unit: &Unit,
    config: &ReaderConfig,
    stats: &mut RunStats,
) -> Result<String, BackendError> {
    let mut attempt: u32 = 0;
    loop {
        match backend
            .translate(&unit.original, &config.source_lang, &config.target_lang)
            .await
        {
            Err(err) if err.is_transient() => {
                if config.max_retries.is_some_and(|max| attempt >= max) {
                    warn!("Unit {}: giving up after {} retries", unit.index, attempt);
                    return Err(err);
                }
                attempt += 1;
                stats.retries += 1;
                warn!(
                    "Unit {}: {} - retry {} in {:?}",
                    unit.index, err, attempt, config.retry_backoff
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_retry(unit.index, attempt, config.retry_backoff);
                }
                sleep(config.retry_backoff).await;
            }
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{SENTINEL_INVALID_RESPONSE, SENTINEL_QUOTA_EXCEEDED, SENTINEL_TRANSLATION_ERROR};
    use crate::progress::TranslationProgressCallback;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Pops scripted outcomes and records when each call arrived.
    struct Scripted {
        outcomes: Mutex<VecDeque<Result<String, BackendError>>>,
        calls: Mutex<Vec<(String, tokio::time::Instant)>>,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<String, BackendError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call_times(&self) -> Vec<tokio::time::Instant> {
            self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
        }
    }

    #[async_trait]
    impl TranslationBackend for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn translate(&self, text: &str, _: &str, _: &str) -> Result<String, BackendError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), tokio::time::Instant::now()));
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(format!("T({text})")))
        }
    }

    fn units(n: usize) -> Vec<Unit> {
        (1..=n).map(|i| Unit::new(i, format!("Sentence {i}."))).collect()
    }

    fn config(max_retries: Option<u32>) -> ReaderConfig {
        ReaderConfig::builder()
            .cooldown(Duration::from_millis(1000))
            .retry_backoff(Duration::from_secs(5))
            .max_retries(max_retries)
            .build()
            .unwrap()
    }

    fn transient() -> Result<String, BackendError> {
        Err(BackendError::Transient {
            detail: "connection refused".into(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn quota_on_third_of_five_halts_the_run() {
        let backend = Scripted::new(vec![
            Ok("Eins".into()),
            Ok("Zwei".into()),
            Err(BackendError::QuotaExceeded {
                detail: "Quota Exceeded".into(),
            }),
        ]);
        let run = translate_units(&backend, units(5), &config(Some(5))).await;

        assert_eq!(backend.call_count(), 3);
        assert_eq!(run.units.len(), 5);
        assert_eq!(run.stats.translated, 2);
        assert_eq!(run.stats.failed, 1);
        assert_eq!(run.stats.not_attempted, 2);
        assert_eq!(run.units[2].translation.display_text(), SENTINEL_QUOTA_EXCEEDED);
        assert_eq!(run.units[3].translation, Translation::Pending);
        assert_eq!(run.units[4].translation, Translation::Pending);
        assert!(matches!(
            run.halted,
            Some(HaltReason::QuotaExceeded { unit: 3, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_retry_the_same_unit_after_backoff() {
        let backend = Scripted::new(vec![transient(), transient(), Ok("Hej".into())]);
        let cfg = config(Some(5));
        let run = translate_units(&backend, units(1), &cfg).await;

        assert_eq!(run.units[0].translation, Translation::Translated("Hej".into()));
        assert_eq!(run.stats.retries, 2);
        assert!(run.halted.is_none());

        let times = backend.call_times();
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= cfg.retry_backoff);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_record_a_generic_failure_and_continue() {
        let backend = Scripted::new(vec![transient(), transient(), transient()]);
        let run = translate_units(&backend, units(2), &config(Some(2))).await;

        // One first attempt + two retries on unit 1, then unit 2.
        assert_eq!(backend.call_count(), 4);
        assert_eq!(run.units[0].translation.display_text(), SENTINEL_TRANSLATION_ERROR);
        assert_eq!(run.units[1].translation, Translation::Translated("T(Sentence 2.)".into()));
        assert!(run.halted.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_fail_on_first_transient_error() {
        let backend = Scripted::new(vec![transient()]);
        let run = translate_units(&backend, units(1), &config(Some(0))).await;
        assert_eq!(backend.call_count(), 1);
        assert_eq!(run.stats.retries, 0);
        assert!(run.units[0].translation.is_failed());
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_retries_keep_going_until_success() {
        let mut script: Vec<_> = (0..12).map(|_| transient()).collect();
        script.push(Ok("endelig".into()));
        let backend = Scripted::new(script);
        let run = translate_units(&backend, units(1), &config(None)).await;
        assert_eq!(run.stats.retries, 12);
        assert_eq!(run.units[0].translation, Translation::Translated("endelig".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn hard_failures_do_not_stop_the_run() {
        let backend = Scripted::new(vec![
            Err(BackendError::Http {
                status: 500,
                detail: "boom".into(),
            }),
            Err(BackendError::InvalidResponse {
                detail: "no translations".into(),
            }),
            Err(BackendError::Other("odd".into())),
        ]);
        let run = translate_units(&backend, units(4), &config(Some(5))).await;

        assert_eq!(backend.call_count(), 4);
        assert_eq!(run.units[0].translation.display_text(), SENTINEL_TRANSLATION_ERROR);
        assert_eq!(run.units[1].translation.display_text(), SENTINEL_INVALID_RESPONSE);
        assert_eq!(run.units[2].translation.display_text(), SENTINEL_TRANSLATION_ERROR);
        assert!(run.units[3].translation.is_translated());
        assert_eq!(run.stats.failed, 3);
        assert_eq!(run.stats.retries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_separates_consecutive_requests() {
        let backend = Scripted::new(vec![]);
        let cfg = config(Some(5));
        let run = translate_units(&backend, units(3), &cfg).await;

        let times = backend.call_times();
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= cfg.cooldown);
        }
        let sent: Vec<String> = backend.calls.lock().unwrap().iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(sent, vec!["Sentence 1.", "Sentence 2.", "Sentence 3."]);
        assert_eq!(run.stats.characters, 33);
    }

    #[tokio::test]
    async fn empty_unit_list_makes_no_requests() {
        let backend = Scripted::new(vec![]);
        let run = translate_units(&backend, Vec::new(), &config(Some(5))).await;
        assert_eq!(backend.call_count(), 0);
        assert_eq!(run.stats, RunStats { duration_ms: run.stats.duration_ms, ..RunStats::default() });
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl TranslationProgressCallback for Recorder {
        fn on_run_start(&self, total: usize) {
            self.events.lock().unwrap().push(format!("start {total}"));
        }
        fn on_unit_complete(&self, index: usize, _: usize, _: usize) {
            self.events.lock().unwrap().push(format!("ok {index}"));
        }
        fn on_unit_error(&self, index: usize, _: usize, _: String) {
            self.events.lock().unwrap().push(format!("err {index}"));
        }
        fn on_retry(&self, index: usize, attempt: u32, _: Duration) {
            self.events.lock().unwrap().push(format!("retry {index}#{attempt}"));
        }
        fn on_run_complete(&self, stats: &RunStats) {
            self.events.lock().unwrap().push(format!("done {}", stats.translated));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn progress_events_follow_the_loop() {
        let recorder = Arc::new(Recorder::default());
        let cfg = ReaderConfig::builder()
            .cooldown(Duration::ZERO)
            .progress_callback(recorder.clone())
            .build()
            .unwrap();
        let backend = Scripted::new(vec![
            transient(),
            Ok("a".into()),
            Err(BackendError::QuotaExceeded { detail: String::new() }),
        ]);
        translate_units(&backend, units(3), &cfg).await;

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["start 3", "retry 1#1", "ok 1", "err 2", "done 1"]
        );
    }
}
