//! Error types shared by the sorting and thumbnail tools.
//!
//! Two tiers: [`ItemError`] describes why a single file could not be
//! handled and never stops a run, [`SetupError`] describes why a run could
//! not be started at all.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure while handling a single work item.
#[derive(Debug, Error)]
pub enum ItemError {
    /// Filesystem operation failed.
    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A numeric tag held something that is not a number.
    #[error("malformed {tag} tag: {value:?}")]
    MalformedTag { tag: &'static str, value: String },

    /// The CreateDate tag could not be parsed.
    #[error("malformed CreateDate tag: {0:?}")]
    MalformedDate(String),

    /// Another file already occupies the computed destination.
    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// An external tool could not be run or exited unsuccessfully.
    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },

    /// Decoding or encoding an image failed.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// The handler panicked while working on the item.
    #[error("worker panicked: {0}")]
    Panicked(String),
}

impl ItemError {
    pub fn io(op: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        ItemError::Io {
            op,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn tool(tool: &'static str, message: impl Into<String>) -> Self {
        ItemError::Tool {
            tool,
            message: message.into(),
        }
    }
}

/// Failure that prevents a run from starting.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{} is neither a directory nor a file", .0.display())]
    BadRoot(PathBuf),

    #[error("cannot use {} as output directory: {source}", path.display())]
    BadOutDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0} not available in PATH")]
    ToolMissing(&'static str),

    #[error("thread count must be at least 1")]
    InvalidThreads,

    #[error("invalid timecode {0:?}, expected HH:MM:SS")]
    InvalidTimecode(String),
}

pub type ItemResult<T> = std::result::Result<T, ItemError>;
