//! Concurrent processing of work items.
//!
//! A producer fills a [`WorkQueue`] while a fixed [`WorkerPool`] drains it,
//! handing each item to a [`Handler`]. Outcomes and failures are tallied in
//! a shared [`RunReport`].

pub mod pool;
pub mod queue;
pub mod report;

pub use pool::{process_all, Handler, WorkItem, WorkerPool};
pub use queue::{Claimed, Closed, WorkQueue};
pub use report::{FailureRecord, Outcome, RunReport, Summary};
