//! Sort music and photo libraries by their embedded metadata, and build the
//! thumbnail cache Synology Photo Station expects.
//!
//! Both tools share the same machinery: a [`scanner`] enumerates candidate
//! files, a fixed pool of workers from [`tasks`] drains them through a
//! handler, and a [`tasks::RunReport`] collects the outcome of every file.

pub mod config;
pub mod error;
pub mod logging;
pub mod organize;
pub mod placement;
pub mod sanitize;
pub mod scanner;
pub mod sync;
pub mod tags;
pub mod tasks;
pub mod thumbs;
