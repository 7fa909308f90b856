//! Reading embedded metadata tags from media files.
//!
//! Extraction is delegated to a [`TagReader`]. The production reader shells
//! out to `exiftool`; a reduced EXIF-only reader covers photo runs on hosts
//! without it. Reading never fails: anything the reader cannot determine is
//! reported as absent so placement can fall back to its defaults.

pub mod embedded;
pub mod exiftool;

use std::path::Path;

pub use embedded::ExifReader;
pub use exiftool::ExifTool;

/// Resolved tag values for one file, keyed by the requested tag names.
///
/// Always holds exactly one entry per requested name, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    values: Vec<(&'static str, Option<String>)>,
}

impl TagSet {
    /// A tag set where every requested tag is absent.
    pub fn absent(names: &[&'static str]) -> Self {
        Self {
            values: names.iter().map(|name| (*name, None)).collect(),
        }
    }

    /// Build a tag set from `(name, value)` pairs.
    pub fn from_pairs<I, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Option<V>)>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(name, value)| (name, value.map(Into::into)))
                .collect(),
        }
    }

    /// Value of `name`, or `None` if absent or never requested.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Replace the value of an already requested tag.
    pub fn set(&mut self, name: &str, value: Option<String>) {
        if let Some(slot) = self.values.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Requested tag names, in request order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(n, _)| *n)
    }

    /// True if no requested tag has a value.
    pub fn all_absent(&self) -> bool {
        self.values.iter().all(|(_, v)| v.is_none())
    }
}

/// Source of metadata tags for a file.
pub trait TagReader: Send + Sync {
    /// Read the given tags from `path`.
    ///
    /// Implementations must return a set with exactly one entry per name and
    /// must not fail; unreadable files yield an all-absent set.
    fn extract_tags(&self, path: &Path, names: &[&'static str]) -> TagSet;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_has_every_name() {
        let tags = TagSet::absent(&["Artist", "Album", "Title"]);
        assert_eq!(tags.len(), 3);
        assert!(tags.all_absent());
        assert_eq!(tags.names().collect::<Vec<_>>(), ["Artist", "Album", "Title"]);
    }

    #[test]
    fn test_set_only_touches_requested_names() {
        let mut tags = TagSet::absent(&["CreateDate"]);
        tags.set("CreateDate", Some("2015:09:28 14:00:00".to_string()));
        tags.set("Keywords", Some("album:x".to_string()));

        assert_eq!(tags.get("CreateDate"), Some("2015:09:28 14:00:00"));
        assert_eq!(tags.get("Keywords"), None);
        assert_eq!(tags.len(), 1);
    }
}
