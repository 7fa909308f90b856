//! Placement rules: where a file belongs, derived from its tags.
//!
//! Each media domain has its own rule set. Both map a file path plus its
//! [`TagSet`] to a [`Placement`], a directory relative to the destination
//! root and a new file name. The rules are pure apart from the photo
//! rules' fallback to filesystem timestamps.

pub mod music;
pub mod photo;

use std::path::{Path, PathBuf};

use crate::error::ItemResult;
use crate::tags::TagSet;

pub use music::MusicRules;
pub use photo::{PhotoRules, PhotoTags};

/// Destination for one file, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub directory: PathBuf,
    pub filename: String,
}

impl Placement {
    /// Absolute destination path below `root`.
    pub fn destination(&self, root: &Path) -> PathBuf {
        root.join(&self.directory).join(&self.filename)
    }
}

/// Rule set for one media domain.
#[derive(Debug, Clone)]
pub enum Rules {
    Music(MusicRules),
    Photo(PhotoRules),
}

impl Rules {
    /// Tags the rule set needs, in the order they are requested.
    pub fn tag_names(&self) -> &'static [&'static str] {
        match self {
            Rules::Music(_) => &music::TAGS,
            Rules::Photo(_) => &photo::TAGS,
        }
    }

    /// Compute where `path` belongs given its tags.
    pub fn place(&self, path: &Path, tags: &TagSet) -> ItemResult<Placement> {
        match self {
            Rules::Music(rules) => rules.place(path, tags),
            Rules::Photo(rules) => rules.place(path, tags),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rules::Music(_) => "music",
            Rules::Photo(_) => "photos",
        }
    }
}
