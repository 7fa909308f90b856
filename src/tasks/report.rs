//! Per-run bookkeeping shared by all workers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::error::ItemError;

/// What happened to a successfully handled item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// File was moved to its new location.
    Moved(PathBuf),
    /// File already sat at its computed location.
    AlreadyInPlace(PathBuf),
    /// Derived artifacts were written.
    Generated { artifacts: usize },
    /// Nothing to do for this item.
    Skipped(String),
}

/// A file that could not be handled, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub path: PathBuf,
    pub error: String,
}

/// Thread-safe tally of a run, written to by every worker.
#[derive(Debug)]
pub struct RunReport {
    started_at: Instant,
    total: AtomicUsize,
    finished: AtomicUsize,
    moved: AtomicUsize,
    already_in_place: AtomicUsize,
    generated: AtomicUsize,
    skipped: AtomicUsize,
    failures: Mutex<Vec<FailureRecord>>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            moved: AtomicUsize::new(0),
            already_in_place: AtomicUsize::new(0),
            generated: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Note that another item was queued.
    pub fn add_expected(&self, count: usize) {
        self.total.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a success. Returns the number of items finished so far.
    pub fn record(&self, outcome: &Outcome) -> usize {
        let counter = match outcome {
            Outcome::Moved(_) => &self.moved,
            Outcome::AlreadyInPlace(_) => &self.already_in_place,
            Outcome::Generated { .. } => &self.generated,
            Outcome::Skipped(_) => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.finished.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a failure. Returns the number of items finished so far.
    pub fn record_failure(&self, path: &Path, error: &ItemError) -> usize {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FailureRecord {
                path: path.to_path_buf(),
                error: error.to_string(),
            });
        self.finished.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Snapshot of the run so far.
    pub fn summary(&self) -> Summary {
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        Summary {
            total: self.total(),
            moved: self.moved.load(Ordering::Relaxed),
            already_in_place: self.already_in_place.load(Ordering::Relaxed),
            generated: self.generated.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failures,
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// End-of-run result.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total: usize,
    pub moved: usize,
    pub already_in_place: usize,
    pub generated: usize,
    pub skipped: usize,
    pub failures: Vec<FailureRecord>,
    pub elapsed_secs: f64,
}

impl Summary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn succeeded(&self) -> usize {
        self.moved + self.already_in_place + self.generated + self.skipped
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Process exit status: 0 when every item succeeded, 2 otherwise.
    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(2)
        }
    }

    /// Log the totals and every failed path.
    pub fn log(&self) {
        tracing::info!(
            total = self.total,
            moved = self.moved,
            already_in_place = self.already_in_place,
            generated = self.generated,
            skipped = self.skipped,
            failed = self.failed(),
            "Finished in {:.0} seconds",
            self.elapsed_secs
        );

        if !self.failures.is_empty() {
            tracing::warn!("The following files had errors during execution:");
            for failure in &self.failures {
                tracing::warn!(error = %failure.error, "\t{}", failure.path.display());
            }
        }
    }

    /// Write the summary as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("creating report file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("writing report to {}", path.display()))?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_counts_by_outcome() {
        let report = RunReport::new();
        report.add_expected(4);
        report.record(&Outcome::Moved(PathBuf::from("/a")));
        report.record(&Outcome::AlreadyInPlace(PathBuf::from("/b")));
        report.record(&Outcome::Skipped("exists".to_string()));
        let finished = report.record_failure(
            Path::new("/c"),
            &ItemError::io("rename", "/c", io::Error::from(io::ErrorKind::PermissionDenied)),
        );
        assert_eq!(finished, 4);

        let summary = report.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.moved, 1);
        assert_eq!(summary.already_in_place, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.succeeded(), 3);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_concurrent_failures_are_not_lost() {
        let report = Arc::new(RunReport::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let report = Arc::clone(&report);
                thread::spawn(move || {
                    for i in 0..50 {
                        let path = PathBuf::from(format!("/{}/{}", t, i));
                        report.record_failure(&path, &ItemError::MalformedDate("x".to_string()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let summary = report.summary();
        assert_eq!(summary.failed(), 400);
        assert!(summary.failures.windows(2).all(|w| w[0].path <= w[1].path));
    }

    #[test]
    fn test_write_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = RunReport::new();
        report.add_expected(1);
        report.record_failure(Path::new("/x.jpg"), &ItemError::MalformedDate("?".to_string()));
        report.summary().write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["failures"][0]["path"], "/x.jpg");
    }
}
