use anyhow::Result;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Which files a walk yields.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Descend into subdirectories instead of listing the root only.
    pub recursive: bool,
    /// Lowercase extensions without the dot. Empty accepts any extension.
    pub extensions: Vec<String>,
    /// File names skipped wherever they appear.
    pub ignored_names: Vec<String>,
    /// Skip dot files and dot directories.
    pub skip_hidden: bool,
    /// Directory name whose subtrees are never entered.
    pub excluded_dir: Option<String>,
}

impl WalkOptions {
    pub fn accepts_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        match path.extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy().to_lowercase();
                self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
            }
            None => false,
        }
    }

    fn is_ignored(&self, name: &OsStr) -> bool {
        let name = name.to_string_lossy();
        self.ignored_names.iter().any(|n| *n == name)
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && self
                .excluded_dir
                .as_deref()
                .is_some_and(|dir| entry.file_name() == dir)
    }

    /// Whether a file named by `path` is a candidate: not ignored, not
    /// hidden when hidden files are skipped, and of an accepted extension.
    pub fn accepts_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        if self.skip_hidden && is_hidden(name) {
            return false;
        }
        !self.is_ignored(name) && self.accepts_extension(path)
    }

    /// Whether the walker should look at `entry` at all.
    fn enters(&self, entry: &DirEntry) -> bool {
        // The root itself is always entered, even when it is a dot directory.
        if entry.depth() == 0 {
            return true;
        }
        if self.skip_hidden && is_hidden(entry.file_name()) {
            return false;
        }
        !self.is_excluded_dir(entry)
    }
}

pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// List the files under `root` that match `options`, sorted by path.
///
/// Entries that cannot be read are logged and skipped.
pub fn discover(root: &Path, options: &WalkOptions) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let mut walker = WalkDir::new(root).follow_links(false).min_depth(1);
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_entry(|e| options.enters(e)) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if !options.accepts_file(entry.path()) {
            continue;
        }
        files.push(entry.into_path());
    }

    files.sort();
    tracing::trace!(root = %root.display(), count = files.len(), "Walk finished");

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().to_string())
            .collect()
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        File::create(root.join("photo1.jpg")).unwrap();
        File::create(root.join("photo2.PNG")).unwrap();
        File::create(root.join("document.txt")).unwrap();
        File::create(root.join(".hidden.jpg")).unwrap();
        File::create(root.join("Thumbs.db")).unwrap();

        fs::create_dir_all(root.join("subdir")).unwrap();
        File::create(root.join("subdir/photo3.jpeg")).unwrap();

        fs::create_dir_all(root.join("subdir/@eaDir/photo3.jpeg")).unwrap();
        File::create(root.join("subdir/@eaDir/photo3.jpeg/SYNOPHOTO_THUMB_M.jpg")).unwrap();

        fs::create_dir_all(root.join(".git")).unwrap();
        File::create(root.join(".git/inside.jpg")).unwrap();
        dir
    }

    fn photo_options(recursive: bool) -> WalkOptions {
        WalkOptions {
            recursive,
            extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            ignored_names: vec!["Thumbs.db".to_string()],
            skip_hidden: true,
            excluded_dir: Some("@eaDir".to_string()),
        }
    }

    #[test]
    fn test_recursive_walk() {
        let dir = fixture();
        let files = discover(dir.path(), &photo_options(true)).unwrap();
        assert_eq!(
            names(dir.path(), &files),
            ["photo1.jpg", "photo2.PNG", "subdir/photo3.jpeg"]
        );
    }

    #[test]
    fn test_single_level_walk() {
        let dir = fixture();
        let files = discover(dir.path(), &photo_options(false)).unwrap();
        assert_eq!(names(dir.path(), &files), ["photo1.jpg", "photo2.PNG"]);
    }

    #[test]
    fn test_any_extension() {
        let dir = fixture();
        let options = WalkOptions {
            recursive: false,
            ..WalkOptions::default()
        };
        let files = discover(dir.path(), &options).unwrap();
        assert_eq!(
            names(dir.path(), &files),
            [".hidden.jpg", "Thumbs.db", "document.txt", "photo1.jpg", "photo2.PNG"]
        );
    }

    #[test]
    fn test_accepts_file() {
        let options = photo_options(false);
        assert!(options.accepts_file(Path::new("/in/IMG_1.JPG")));
        assert!(!options.accepts_file(Path::new("/in/notes.txt")));
        assert!(!options.accepts_file(Path::new("/in/.hidden.jpg")));
        assert!(!options.accepts_file(Path::new("/in/Thumbs.db")));
        assert!(!options.accepts_file(Path::new("/")));
    }

    #[test]
    fn test_root_must_be_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.jpg");
        File::create(&file).unwrap();
        assert!(discover(&file, &WalkOptions::default()).is_err());
    }
}
