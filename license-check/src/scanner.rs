//! Bounded-concurrency header scan.
//!
//! Files are fed through a bounded task queue to a fixed pool of scoped
//! worker threads. Workers report completions on a result channel that the
//! calling thread drains, so callbacks fire in completion order, not input
//! order. The first worker failure wins a single-assignment slot, raises the
//! stop flag and ends the scan once the pool has been joined. Callbacks that
//! already fired are not rolled back.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;

use crossbeam_channel::{bounded, unbounded};
use serde::Serialize;
use tracing::{debug, warn};

use crate::document::{ClassificationOutcome, Document, DocumentClassifier, HeaderMatch};
use crate::error::{ConfigError, Error, ScanError};
use crate::template::HeaderTemplate;

/// Receives the result of each classified file.
///
/// Invoked concurrently from worker threads.
pub trait HeaderCallback: Sync {
    /// The document carries the canonical header, an accepted alternate, or
    /// is the canonical header file itself. `header` is always the canonical
    /// template.
    fn on_existing_header(&self, document: &Document, header: &HeaderTemplate);

    /// The document matches no accepted header.
    fn on_header_not_found(&self, document: &Document, header: &HeaderTemplate);
}

/// Cooperative cancellation shared between a caller and a running scan.
///
/// The flag stays raised once cancelled: every later scan sharing it is
/// aborted until [`CancelFlag::reset`] is called.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the scan to stop. Files already being classified finish.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Lower the flag so the next scan runs to completion.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-outcome counts of a completed scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct ScanSummary {
    pub submitted: usize,
    pub header_files: usize,
    pub existing: usize,
    pub missing: usize,
    pub unsupported: usize,
}

impl ScanSummary {
    fn record(&mut self, outcome: ClassificationOutcome) {
        match outcome {
            ClassificationOutcome::Unsupported => self.unsupported += 1,
            ClassificationOutcome::IsHeaderItself => self.header_files += 1,
            ClassificationOutcome::HasHeader(_) => self.existing += 1,
            ClassificationOutcome::Missing => self.missing += 1,
        }
    }

    /// Files that went through classification, whatever the outcome.
    #[must_use]
    pub fn classified(&self) -> usize {
        self.header_files + self.existing + self.missing + self.unsupported
    }
}

enum Completion {
    Classified(ClassificationOutcome),
    /// The error itself sits in the scan's failure slot.
    Failed,
    Cancelled,
}

/// Number of workers for a concurrency factor: `ceil(available * factor)`,
/// at least one.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn pool_size(available_parallelism: usize, concurrency_factor: f32) -> usize {
    let threads = (available_parallelism as f64 * f64::from(concurrency_factor)).ceil();
    if threads.is_finite() && threads >= 1.0 {
        threads as usize
    } else {
        1
    }
}

/// Runs a [`DocumentClassifier`] over a file set on a worker pool.
#[derive(Debug, Clone)]
pub struct ConcurrentScanner {
    threads: usize,
    root_dir: PathBuf,
    cancel: CancelFlag,
}

impl ConcurrentScanner {
    /// Size the pool from the machine's available parallelism.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConcurrency`] unless the factor is a
    /// finite, strictly positive number.
    pub fn new(concurrency_factor: f32) -> Result<Self, ConfigError> {
        if !concurrency_factor.is_finite() || concurrency_factor <= 0.0 {
            return Err(ConfigError::InvalidConcurrency(concurrency_factor));
        }
        let available = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Ok(Self::with_threads(pool_size(available, concurrency_factor)))
    }

    /// Fixed pool size; zero is raised to one.
    #[must_use]
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
            root_dir: PathBuf::new(),
            cancel: CancelFlag::new(),
        }
    }

    /// Override the pool size; zero is raised to one.
    #[must_use]
    pub fn with_pool_size(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Base directory for the paths shown in log lines.
    #[must_use]
    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Workers actually started for `files` files: never more than there
    /// are files to classify, and at least one.
    fn worker_count(&self, files: usize) -> usize {
        self.threads.min(files).max(1)
    }

    /// Classify every file and dispatch the outcomes to `callback`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scan`] with the first worker failure,
    /// [`Error::Aborted`] if the cancel flag was raised before every file
    /// completed, or [`Error::WorkerSpawn`] if a thread could not be
    /// started.
    pub fn scan<C>(
        &self,
        files: &[PathBuf],
        classifier: &DocumentClassifier,
        callback: &C,
    ) -> Result<ScanSummary, Error>
    where
        C: HeaderCallback + ?Sized,
    {
        let workers = self.worker_count(files.len());
        debug!(
            "Number of execution threads: {workers} (pool of {})",
            self.threads
        );

        let stop = AtomicBool::new(false);
        let failure: OnceLock<ScanError> = OnceLock::new();
        let (task_tx, task_rx) = bounded::<&Path>(workers.saturating_mul(2));
        let (done_tx, done_rx) = unbounded::<Completion>();

        // Returning early drops the task sender, so workers already started
        // drain an empty, disconnected queue and exit.
        let scanned = thread::scope(|scope| -> Result<(ScanSummary, usize), Error> {
            let stop = &stop;
            let failure = &failure;

            for index in 0..workers {
                let task_rx = task_rx.clone();
                let done_tx = done_tx.clone();
                thread::Builder::new()
                    .name(format!("license-check-{index}"))
                    .spawn_scoped(scope, move || {
                        for path in task_rx {
                            let halted =
                                stop.load(Ordering::Acquire) || self.cancel.is_cancelled();
                            let completion = if halted {
                                Completion::Cancelled
                            } else {
                                match self.process(path, classifier, callback) {
                                    Ok(outcome) => Completion::Classified(outcome),
                                    Err(err) => {
                                        let _ = failure.set(err);
                                        Completion::Failed
                                    }
                                }
                            };
                            if done_tx.send(completion).is_err() {
                                break;
                            }
                        }
                    })
                    .map_err(Error::WorkerSpawn)?;
            }
            drop(task_rx);
            drop(done_tx);

            thread::Builder::new()
                .name("license-check-feeder".to_owned())
                .spawn_scoped(scope, move || {
                    for file in files {
                        if stop.load(Ordering::Acquire) || self.cancel.is_cancelled() {
                            break;
                        }
                        if task_tx.send(file.as_path()).is_err() {
                            break;
                        }
                    }
                })
                .map_err(Error::WorkerSpawn)?;

            let mut summary = ScanSummary::default();
            let mut pending = files.len();
            let mut cancelled = 0;
            while pending > 0 {
                // Disconnected means the feeder stopped early and every
                // worker has exited: the caller cancelled.
                let Ok(completion) = done_rx.recv() else {
                    break;
                };
                pending -= 1;
                match completion {
                    Completion::Classified(outcome) => summary.record(outcome),
                    Completion::Cancelled => cancelled += 1,
                    Completion::Failed => {
                        stop.store(true, Ordering::Release);
                        break;
                    }
                }
            }
            Ok((summary, pending + cancelled))
        });
        let (summary, unfinished) = scanned?;

        if let Some(err) = failure.into_inner() {
            return Err(Error::Scan(err));
        }
        if unfinished > 0 {
            return Err(Error::Aborted);
        }
        Ok(ScanSummary {
            submitted: files.len(),
            ..summary
        })
    }

    fn process<C>(
        &self,
        path: &Path,
        classifier: &DocumentClassifier,
        callback: &C,
    ) -> Result<ClassificationOutcome, ScanError>
    where
        C: HeaderCallback + ?Sized,
    {
        let document = classifier.document_for(path);
        let relative = document.relative_to(&self.root_dir).display();
        debug!(
            "Selected file: {} [header style: {}]",
            relative,
            document.style().name()
        );

        let outcome = classifier.classify(&document)?;
        match outcome {
            ClassificationOutcome::Unsupported => {
                warn!(
                    "Unknown file extension: {} [header style: {}]",
                    relative,
                    document.style().name()
                );
            }
            ClassificationOutcome::IsHeaderItself => {
                debug!("Header file: {}", relative);
                callback.on_existing_header(&document, classifier.canonical());
            }
            ClassificationOutcome::HasHeader(HeaderMatch::Canonical) => {
                callback.on_existing_header(&document, classifier.canonical());
            }
            ClassificationOutcome::HasHeader(HeaderMatch::Alternate(index)) => {
                debug!("Alternate header #{} found in {}", index, relative);
                callback.on_existing_header(&document, classifier.canonical());
            }
            ClassificationOutcome::Missing => {
                callback.on_header_not_found(&document, classifier.canonical());
            }
        }
        Ok(outcome)
    }
}
