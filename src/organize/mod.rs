//! Classify-and-rename: move every file of a tree to the place its tags
//! dictate.
//!
//! One pipeline serves both media domains. The domain only decides which
//! tags are read and how they map to a [`Placement`]:
//!
//! ```text
//! /Music/
//! └── B/
//!     └── Beatles The/
//!         └── Abbey Road/
//!             └── 01 Come Together.mp3
//! /Photos/
//! └── 2015/
//!     └── 09 September/
//!         └── 2015-09-28_Birthday.jpg
//! ```

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{ItemError, ItemResult, SetupError};
use crate::placement::{Placement, Rules};
use crate::scanner::{discover, prune_empty_dirs, WalkOptions};
use crate::tags::TagReader;
use crate::tasks::{process_all, Handler, Outcome, Summary};

/// Per-file handler: read tags, compute the placement, move the file.
pub struct Sorter {
    rules: Rules,
    reader: Arc<dyn TagReader>,
    out_dir: PathBuf,
    /// Destinations claimed during this run, so two workers never race
    /// for the same target.
    reserved: Mutex<HashSet<PathBuf>>,
}

impl Sorter {
    pub fn new(rules: Rules, reader: Arc<dyn TagReader>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules,
            reader,
            out_dir: out_dir.into(),
            reserved: Mutex::new(HashSet::new()),
        }
    }

    /// Where `path` belongs, relative to the output directory.
    pub fn placement(&self, path: &Path) -> ItemResult<Placement> {
        let tags = self.reader.extract_tags(path, self.rules.tag_names());
        if tags.all_absent() {
            tracing::debug!(path = %path.display(), "No tags found, using defaults");
        }
        self.rules.place(path, &tags)
    }

    fn reserve(&self, destination: &Path) -> bool {
        self.reserved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(destination.to_path_buf())
    }

    fn release(&self, destination: &Path) {
        self.reserved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(destination);
    }
}

impl Handler<PathBuf> for Sorter {
    fn handle(&self, path: &PathBuf) -> ItemResult<Outcome> {
        let destination = self.placement(path)?.destination(&self.out_dir);

        if is_same_file(path, &destination) {
            return Ok(Outcome::AlreadyInPlace(destination));
        }
        if !self.reserve(&destination) {
            return Err(ItemError::DestinationExists(destination));
        }

        let result = move_file(path, &destination);
        if result.is_err() {
            self.release(&destination);
        }
        result
    }
}

fn is_same_file(source: &Path, destination: &Path) -> bool {
    if source == destination {
        return true;
    }
    match (source.canonicalize(), destination.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Move `source` to `destination`, creating parent directories as needed.
///
/// Never overwrites: an occupied destination is an error. Moves across
/// filesystems fall back to copy and remove.
pub fn move_file(source: &Path, destination: &Path) -> ItemResult<Outcome> {
    if is_same_file(source, destination) {
        return Ok(Outcome::AlreadyInPlace(destination.to_path_buf()));
    }
    if destination.symlink_metadata().is_ok() {
        return Err(ItemError::DestinationExists(destination.to_path_buf()));
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| ItemError::io("create directory", parent, e))?;
    }

    match fs::rename(source, destination) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(source, destination).map_err(|e| ItemError::io("copy", source, e))?;
            fs::remove_file(source).map_err(|e| ItemError::io("remove", source, e))?;
        }
        Err(e) => return Err(ItemError::io("move", source, e)),
    }

    Ok(Outcome::Moved(destination.to_path_buf()))
}

/// Settings for one sorting run.
#[derive(Debug, Clone)]
pub struct SortOptions {
    /// Directory to scan, or a single file to rename.
    pub root: PathBuf,
    /// Destination root. Defaults to the scanned directory, or the parent
    /// of a single file.
    pub out_dir: Option<PathBuf>,
    pub threads: usize,
    /// Remove empty directories below the root afterwards. Only honoured
    /// for recursive directory runs.
    pub squash: bool,
    pub walk: WalkOptions,
}

/// Sort every candidate file under `options.root`.
pub fn run(rules: Rules, reader: Arc<dyn TagReader>, options: &SortOptions) -> Result<Summary> {
    if options.threads == 0 {
        return Err(SetupError::InvalidThreads.into());
    }

    let root = &options.root;
    let metadata = fs::metadata(root).map_err(|_| SetupError::BadRoot(root.clone()))?;
    let is_dir = metadata.is_dir();
    if !is_dir && !metadata.is_file() {
        return Err(SetupError::BadRoot(root.clone()).into());
    }

    let out_dir = match &options.out_dir {
        Some(dir) => dir.clone(),
        None if is_dir => root.clone(),
        None => match root.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };
    fs::create_dir_all(&out_dir).map_err(|source| SetupError::BadOutDir {
        path: out_dir.clone(),
        source,
    })?;

    let files = if is_dir {
        discover(root, &options.walk)
            .with_context(|| format!("scanning {}", root.display()))?
    } else if options.walk.accepts_file(root) {
        vec![root.clone()]
    } else {
        tracing::info!(path = %root.display(), "Not a candidate file, nothing to do");
        Vec::new()
    };

    tracing::info!(
        root = %root.display(),
        out = %out_dir.display(),
        kind = rules.name(),
        "Found {} files",
        files.len()
    );

    let sorter = Arc::new(Sorter::new(rules, reader, &out_dir));
    let summary = process_all(files, options.threads, sorter)?;

    if options.squash && is_dir && options.walk.recursive {
        tracing::info!("Removing empty directories");
        let removed = prune_empty_dirs(root)?;
        tracing::debug!(removed, "Pruned empty directories");
    }

    Ok(summary)
}
