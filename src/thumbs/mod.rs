//! Thumbnail cache for Synology Photo Station.
//!
//! Every media file gets a directory `<dir>/@eaDir/<file name>/` holding
//! the artifacts Photo Station would otherwise render on the NAS itself:
//!
//! ```text
//! Holiday/
//! ├── IMG_0001.jpg
//! └── @eaDir/
//!     └── IMG_0001.jpg/
//!         ├── SYNOPHOTO_THUMB_XL.jpg
//!         ├── SYNOPHOTO_THUMB_L.jpg
//!         ├── SYNOPHOTO_THUMB_B.jpg
//!         ├── SYNOPHOTO_THUMB_M.jpg
//!         ├── SYNOPHOTO_THUMB_S.jpg
//!         └── SYNOPHOTO_THUMB_PREVIEW.jpg
//! ```
//!
//! Videos get a flash preview plus the XL and M thumbnails of one frame.

pub mod render;
pub mod tools;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;

use crate::error::{ItemError, ItemResult, SetupError};
use crate::scanner::{discover, WalkOptions};
use crate::tasks::{process_all, Handler, Outcome, Summary, WorkItem};

pub use tools::{Capabilities, ExternalTools, MediaTools, Timecode};

/// Thumbnails in descending size, each fitted into a square box.
pub const THUMB_SIZES: [(&str, u32); 5] = [
    ("SYNOPHOTO_THUMB_XL.jpg", 1280),
    ("SYNOPHOTO_THUMB_L.jpg", 800),
    ("SYNOPHOTO_THUMB_B.jpg", 640),
    ("SYNOPHOTO_THUMB_M.jpg", 320),
    ("SYNOPHOTO_THUMB_S.jpg", 160),
];

pub const PREVIEW_NAME: &str = "SYNOPHOTO_THUMB_PREVIEW.jpg";
pub const PREVIEW_SIZE: (u32, u32) = (120, 160);

pub const VIDEO_THUMB_SIZES: [(&str, u32); 2] = [THUMB_SIZES[0], THUMB_SIZES[3]];
pub const FILM_NAME: &str = "SYNOPHOTO:FILM.flv";

pub const DEFAULT_THUMB_DIR: &str = "@eaDir";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Decoded in-process.
    Image,
    /// Decoded through dcraw.
    Raw,
    /// Handled by ffmpeg.
    Video,
}

/// A file queued for thumbnailing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl WorkItem for MediaItem {
    fn path(&self) -> &Path {
        &self.path
    }
}

/// Lowercase extensions of each media class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaClasses {
    pub image: Vec<String>,
    pub raw: Vec<String>,
    pub video: Vec<String>,
}

impl MediaClasses {
    pub fn classify(&self, path: &Path) -> Option<MediaKind> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        let has = |list: &[String]| list.iter().any(|e| *e == ext);
        if has(&self.image) {
            Some(MediaKind::Image)
        } else if has(&self.raw) {
            Some(MediaKind::Raw)
        } else if has(&self.video) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Drop the classes this host cannot decode.
    pub fn restrict(mut self, capabilities: Capabilities) -> Self {
        if !capabilities.raw {
            self.raw.clear();
        }
        if !capabilities.video {
            self.video.clear();
        }
        self
    }

    pub fn extensions(&self) -> Vec<String> {
        self.image
            .iter()
            .chain(&self.raw)
            .chain(&self.video)
            .cloned()
            .collect()
    }
}

/// Names of the artifacts generated for one media kind.
pub fn artifact_names(kind: MediaKind) -> Vec<&'static str> {
    match kind {
        MediaKind::Image | MediaKind::Raw => THUMB_SIZES
            .iter()
            .map(|(name, _)| *name)
            .chain([PREVIEW_NAME])
            .collect(),
        MediaKind::Video => [FILM_NAME]
            .into_iter()
            .chain(VIDEO_THUMB_SIZES.iter().map(|(name, _)| *name))
            .collect(),
    }
}

/// Artifact directory of `path`: `<parent>/<thumb_dir>/<file name>`.
pub fn thumbs_dir_for(path: &Path, thumb_dir: &str) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let name = path.file_name().unwrap_or_default();
    parent.join(thumb_dir).join(name)
}

/// Per-file handler writing the artifact set.
pub struct ThumbnailGenerator {
    tools: Arc<dyn MediaTools>,
    thumb_dir: String,
    quality: u8,
    video_duration: u32,
    video_timecode: Timecode,
    force: bool,
}

impl ThumbnailGenerator {
    pub fn new(tools: Arc<dyn MediaTools>, options: &ThumbOptions) -> Self {
        Self {
            tools,
            thumb_dir: options.thumb_dir.clone(),
            quality: options.quality,
            video_duration: options.video_duration,
            video_timecode: options.video_timecode.clone(),
            force: options.force,
        }
    }

    fn is_complete(dir: &Path, kind: MediaKind) -> bool {
        artifact_names(kind).iter().all(|name| dir.join(name).is_file())
    }

    /// Shrink consecutively through `sizes`, saving each step.
    fn write_sizes(
        &self,
        mut image: DynamicImage,
        sizes: &[(&str, u32)],
        dir: &Path,
    ) -> ItemResult<DynamicImage> {
        for (name, size) in sizes {
            image = render::shrink_to_fit(image, *size, *size);
            render::save_jpeg(&image, &dir.join(name), self.quality)?;
        }
        Ok(image)
    }

    fn write_image_set(&self, image: DynamicImage, dir: &Path) -> ItemResult<usize> {
        let smallest = self.write_sizes(image, &THUMB_SIZES, dir)?;
        let (width, height) = PREVIEW_SIZE;
        let preview = render::letterbox(smallest, width, height);
        render::save_rgb(&preview, &dir.join(PREVIEW_NAME), self.quality)?;
        Ok(THUMB_SIZES.len() + 1)
    }

    fn write_video_set(&self, path: &Path, dir: &Path) -> ItemResult<usize> {
        self.tools
            .transcode_preview(path, &dir.join(FILM_NAME), self.video_duration)?;
        let frame = self.tools.extract_frame(path, &self.video_timecode)?;
        self.write_sizes(frame, &VIDEO_THUMB_SIZES, dir)?;
        Ok(VIDEO_THUMB_SIZES.len() + 1)
    }
}

impl Handler<MediaItem> for ThumbnailGenerator {
    fn handle(&self, item: &MediaItem) -> ItemResult<Outcome> {
        let dir = thumbs_dir_for(&item.path, &self.thumb_dir);
        if !self.force && Self::is_complete(&dir, item.kind) {
            return Ok(Outcome::Skipped("thumbnails exist".to_string()));
        }

        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "Creating thumbnail directory");
            fs::create_dir_all(&dir).map_err(|e| ItemError::io("create directory", &dir, e))?;
        }

        let artifacts = match item.kind {
            MediaKind::Image => {
                let image = image::open(&item.path)?;
                let image = render::apply_orientation(image, &item.path);
                self.write_image_set(image, &dir)?
            }
            MediaKind::Raw => {
                let image = self.tools.decode_raw(&item.path)?;
                self.write_image_set(image, &dir)?
            }
            MediaKind::Video => self.write_video_set(&item.path, &dir)?,
        };

        Ok(Outcome::Generated { artifacts })
    }
}

/// Settings for one thumbnail run.
#[derive(Debug, Clone)]
pub struct ThumbOptions {
    pub root: PathBuf,
    pub threads: usize,
    /// Regenerate artifacts that already exist.
    pub force: bool,
    pub quality: u8,
    /// Length of video previews in seconds.
    pub video_duration: u32,
    pub video_timecode: Timecode,
    pub thumb_dir: String,
    pub classes: MediaClasses,
    pub ignored_names: Vec<String>,
}

/// Generate the artifact set for every media file below `options.root`.
pub fn run(options: &ThumbOptions, tools: Arc<dyn MediaTools>, capabilities: Capabilities) -> Result<Summary> {
    if options.threads == 0 {
        return Err(SetupError::InvalidThreads.into());
    }
    let root = &options.root;
    if !root.is_dir() {
        return Err(SetupError::BadRoot(root.clone()).into());
    }

    let classes = options.classes.clone().restrict(capabilities);
    let walk = WalkOptions {
        recursive: true,
        extensions: classes.extensions(),
        ignored_names: options.ignored_names.clone(),
        skip_hidden: true,
        excluded_dir: Some(options.thumb_dir.clone()),
    };

    let items: Vec<MediaItem> = discover(root, &walk)
        .with_context(|| format!("scanning {}", root.display()))?
        .into_iter()
        .filter_map(|path| {
            let kind = classes.classify(&path)?;
            Some(MediaItem { path, kind })
        })
        .collect();

    tracing::info!(root = %root.display(), "Found {} media files", items.len());

    let generator = Arc::new(ThumbnailGenerator::new(tools, options));
    process_all(items, options.threads, generator)
}
