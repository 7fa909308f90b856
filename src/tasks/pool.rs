//! Fixed-size pool of worker threads draining a [`WorkQueue`].

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::queue::WorkQueue;
use super::report::{Outcome, RunReport, Summary};
use crate::error::{ItemError, ItemResult, SetupError};

/// Anything a worker can process. Failures are reported against its path.
pub trait WorkItem: Send + 'static {
    fn path(&self) -> &Path;
}

impl WorkItem for PathBuf {
    fn path(&self) -> &Path {
        self
    }
}

/// Per-item processing step run by every worker.
pub trait Handler<T>: Send + Sync + 'static {
    fn handle(&self, item: &T) -> ItemResult<Outcome>;
}

/// Running worker threads.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `threads` workers, each looping on `queue` until it is closed.
    pub fn spawn<T, H>(
        threads: usize,
        queue: &Arc<WorkQueue<T>>,
        handler: &Arc<H>,
        report: &Arc<RunReport>,
    ) -> io::Result<Self>
    where
        T: WorkItem,
        H: Handler<T>,
    {
        let mut handles = Vec::with_capacity(threads);
        for index in 0..threads {
            let worker_queue = Arc::clone(queue);
            let handler = Arc::clone(handler);
            let report = Arc::clone(report);

            let spawned = thread::Builder::new()
                .name(format!("worker-{}", index + 1))
                .spawn(move || worker_loop(&worker_queue, handler.as_ref(), &report));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Let the workers that did start exit before bailing out.
                    queue.close();
                    WorkerPool { handles }.wait();
                    return Err(e);
                }
            }
        }
        Ok(Self { handles })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker thread to exit. The queue must be closed first.
    pub fn wait(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                tracing::error!("worker thread terminated abnormally");
            }
        }
    }
}

fn worker_loop<T, H>(queue: &WorkQueue<T>, handler: &H, report: &RunReport)
where
    T: WorkItem,
    H: Handler<T> + ?Sized,
{
    while let Some(item) = queue.claim() {
        let path = item.path();
        tracing::debug!(path = %path.display(), "Working on file");

        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&item)))
            .unwrap_or_else(|payload| Err(ItemError::Panicked(panic_message(payload.as_ref()))));

        match result {
            Ok(outcome) => {
                let done = report.record(&outcome);
                log_outcome(path, &outcome, done, report.total());
            }
            Err(e) => {
                let done = report.record_failure(path, &e);
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "[{}/{}] Failed",
                    done,
                    report.total()
                );
            }
        }
    }
    tracing::trace!("worker exiting");
}

fn log_outcome(path: &Path, outcome: &Outcome, done: usize, total: usize) {
    match outcome {
        Outcome::Moved(to) => {
            tracing::debug!(from = %path.display(), "[{}/{}] Moved file to {}", done, total, to.display())
        }
        Outcome::AlreadyInPlace(_) => {
            tracing::debug!(path = %path.display(), "[{}/{}] Already in place", done, total)
        }
        Outcome::Generated { artifacts } => tracing::debug!(
            path = %path.display(),
            artifacts,
            "[{}/{}] Generated thumbnails",
            done,
            total
        ),
        Outcome::Skipped(reason) => {
            tracing::debug!(path = %path.display(), reason = %reason, "[{}/{}] Skipped", done, total)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Process every item with `threads` workers and return the run summary.
///
/// Workers start before the first item is queued. Once the queue has
/// drained it is closed, and the call returns only after every worker has
/// exited. A failing item never stops the run.
pub fn process_all<T, H, I>(items: I, threads: usize, handler: Arc<H>) -> anyhow::Result<Summary>
where
    T: WorkItem,
    H: Handler<T>,
    I: IntoIterator<Item = T>,
{
    if threads == 0 {
        return Err(SetupError::InvalidThreads.into());
    }

    let queue = Arc::new(WorkQueue::new());
    let report = Arc::new(RunReport::new());

    tracing::debug!(threads, "Starting worker threads");
    let pool = WorkerPool::spawn(threads, &queue, &handler, &report)?;

    for item in items {
        report.add_expected(1);
        if queue.put(item).is_err() {
            anyhow::bail!("work queue closed before all items were queued");
        }
    }

    queue.join();
    tracing::debug!("Terminating worker threads");
    queue.close();
    pool.wait();

    Ok(report.summary())
}
