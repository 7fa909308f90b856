use anyhow::Result;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Remove every empty directory below `root`, deepest first.
///
/// Directories that only contained empty directories are removed too. The
/// root itself is kept. Returns the number of directories removed.
pub fn prune_empty_dirs(root: &Path) -> Result<usize> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let mut removed = 0;
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let is_empty = match fs::read_dir(path) {
            Ok(mut entries) => entries.next().is_none(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read directory");
                continue;
            }
        };
        if !is_empty {
            continue;
        }

        match fs::remove_dir(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed empty directory");
                removed += 1;
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Cannot remove directory"),
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_prunes_nested_empty_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("keep/empty")).unwrap();
        File::create(root.join("keep/song.mp3")).unwrap();

        let removed = prune_empty_dirs(root).unwrap();

        assert_eq!(removed, 4);
        assert!(root.exists());
        assert!(!root.join("a").exists());
        assert!(root.join("keep/song.mp3").exists());
        assert!(!root.join("keep/empty").exists());
    }

    #[test]
    fn test_empty_root_is_kept() {
        let dir = tempdir().unwrap();
        assert_eq!(prune_empty_dirs(dir.path()).unwrap(), 0);
        assert!(dir.path().exists());
    }
}
