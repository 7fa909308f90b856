use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::placement::photo::ENGLISH_MONTHS;
use crate::sync::SyncScope;
use crate::thumbs::DEFAULT_THUMB_DIR;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "MEDIASHELF_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of worker threads.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Directory for daily log files. Logs go to stderr only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    #[serde(default)]
    pub music: MusicConfig,

    #[serde(default)]
    pub photos: PhotoConfig,

    #[serde(default)]
    pub thumbnails: ThumbnailConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicConfig {
    #[serde(default = "default_music_extensions")]
    pub extensions: Vec<String>,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            extensions: default_music_extensions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoConfig {
    #[serde(default = "default_photo_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_ignored_files")]
    pub ignored_files: Vec<String>,

    /// Name of the per-directory thumbnail cache, never sorted.
    #[serde(default = "default_thumb_dir")]
    pub thumb_dir: String,

    /// Month names used for album directories, January first.
    #[serde(default = "default_month_names")]
    pub month_names: Vec<String>,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            extensions: default_photo_extensions(),
            ignored_files: default_ignored_files(),
            thumb_dir: default_thumb_dir(),
            month_names: default_month_names(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// JPEG quality, 1-100.
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Length of video previews in seconds.
    #[serde(default = "default_video_duration")]
    pub video_duration: u32,

    /// Position of the video frame used for thumbnails, `HH:MM:SS`.
    #[serde(default = "default_video_timecode")]
    pub video_timecode: String,

    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    #[serde(default = "default_raw_extensions")]
    pub raw_extensions: Vec<String>,

    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,

    #[serde(default = "default_ignored_files")]
    pub ignored_files: Vec<String>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            video_duration: default_video_duration(),
            video_timecode: default_video_timecode(),
            image_extensions: default_image_extensions(),
            raw_extensions: default_raw_extensions(),
            video_extensions: default_video_extensions(),
            ignored_files: default_ignored_files(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Passed to rsync as `--iconv`, e.g. `UTF8-MAC,UTF-8`.
    #[serde(default)]
    pub iconv: Option<String>,

    #[serde(default)]
    pub scope: SyncScope,
}

fn default_threads() -> usize {
    4
}

fn default_music_extensions() -> Vec<String> {
    strings(&["mp3", "m4a"])
}

fn default_image_extensions() -> Vec<String> {
    strings(&["jpg", "png", "jpeg", "tif", "bmp"])
}

fn default_raw_extensions() -> Vec<String> {
    strings(&["arw"])
}

fn default_video_extensions() -> Vec<String> {
    strings(&["mov", "m4v", "mp4"])
}

fn default_photo_extensions() -> Vec<String> {
    let mut extensions = default_image_extensions();
    extensions.extend(default_raw_extensions());
    extensions.extend(default_video_extensions());
    extensions
}

fn default_ignored_files() -> Vec<String> {
    strings(&[".DS_Store", ".apdisk", "Thumbs.db"])
}

fn default_thumb_dir() -> String {
    DEFAULT_THUMB_DIR.to_string()
}

fn default_month_names() -> Vec<String> {
    strings(&ENGLISH_MONTHS)
}

fn default_quality() -> u8 {
    90
}

fn default_video_duration() -> u32 {
    30
}

fn default_video_timecode() -> String {
    "00:00:03".to_string()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            log_dir: None,
            music: MusicConfig::default(),
            photos: PhotoConfig::default(),
            thumbnails: ThumbnailConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl Config {
    /// Load the config from `explicit`, `$MEDIASHELF_CONFIG` or the default
    /// location, in that order.
    ///
    /// A missing file at the default location yields the defaults; a
    /// missing file that was asked for explicitly is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let requested = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        match requested {
            Some(path) => Self::load_from(&path),
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Write the config to `path`, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("writing config file {}", config_path.display()))?;

        Ok(config_path)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mediashelf")
            .join("config.toml")
    }
}
