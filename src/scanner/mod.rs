//! Enumerating candidate media files and tidying up source trees.

pub mod cleanup;
pub mod discovery;

pub use cleanup::prune_empty_dirs;
pub use discovery::{discover, is_hidden, WalkOptions};
