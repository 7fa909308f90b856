//! External decoders: `dcraw` for raw photos, `ffmpeg` for videos.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::str::FromStr;
use std::sync::LazyLock;

use image::{DynamicImage, ImageFormat};
use regex::Regex;

use crate::error::{ItemError, ItemResult, SetupError};

static TIMECODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{2}:[0-9]{2}:[0-9]{2}$").unwrap());

/// Position in a video, `HH:MM:SS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timecode(String);

impl FromStr for Timecode {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if TIMECODE.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(SetupError::InvalidTimecode(s.to_string()))
        }
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Default for Timecode {
    fn default() -> Self {
        Self("00:00:03".to_string())
    }
}

/// Decoders for media the `image` crate cannot read itself.
pub trait MediaTools: Send + Sync {
    /// Decode a camera raw file into an 8-bit image.
    fn decode_raw(&self, path: &Path) -> ItemResult<DynamicImage>;

    /// Write a low-resolution flash video preview of at most `duration`
    /// seconds to `output`.
    fn transcode_preview(&self, input: &Path, output: &Path, duration: u32) -> ItemResult<()>;

    /// Grab the frame at `timecode`.
    fn extract_frame(&self, input: &Path, timecode: &Timecode) -> ItemResult<DynamicImage>;
}

/// Which optional media classes can be handled on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub raw: bool,
    pub video: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            raw: true,
            video: true,
        }
    }
}

/// [`MediaTools`] backed by `dcraw` and `ffmpeg` from `PATH`.
#[derive(Debug, Clone, Default)]
pub struct ExternalTools {
    dcraw: Option<PathBuf>,
    ffmpeg: Option<PathBuf>,
}

impl ExternalTools {
    /// Look up both tools once, warning about each one that is missing.
    pub fn probe() -> Self {
        let dcraw = which::which("dcraw").ok();
        if dcraw.is_none() {
            tracing::warn!("dcraw not available in PATH, raw images will be skipped");
        }
        let ffmpeg = which::which("ffmpeg").ok();
        if ffmpeg.is_none() {
            tracing::warn!("ffmpeg not available in PATH, videos will be skipped");
        }
        Self { dcraw, ffmpeg }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            raw: self.dcraw.is_some(),
            video: self.ffmpeg.is_some(),
        }
    }

    fn ffmpeg(&self) -> ItemResult<Command> {
        let program = self
            .ffmpeg
            .as_ref()
            .ok_or_else(|| ItemError::tool("ffmpeg", "not installed"))?;
        let mut cmd = Command::new(program);
        cmd.arg("-loglevel").arg("panic");
        Ok(cmd)
    }
}

impl MediaTools for ExternalTools {
    fn decode_raw(&self, path: &Path) -> ItemResult<DynamicImage> {
        let program = self
            .dcraw
            .as_ref()
            .ok_or_else(|| ItemError::tool("dcraw", "not installed"))?;

        let output = Command::new(program)
            .args(["-c", "-b", "8", "-q", "0", "-w", "-H", "5"])
            .arg(path)
            .output();
        let output = check("dcraw", output)?;

        Ok(image::load_from_memory_with_format(&output.stdout, ImageFormat::Pnm)?)
    }

    fn transcode_preview(&self, input: &Path, output: &Path, duration: u32) -> ItemResult<()> {
        let mut cmd = self.ffmpeg()?;
        cmd.arg("-i")
            .arg(input)
            .args(["-y", "-ar", "44100", "-r", "12", "-ac", "2", "-f", "flv"])
            .args(["-qscale", "5", "-s", "320x180", "-aspect", "320:180"])
            .arg("-t")
            .arg(duration.to_string())
            .arg(output);
        check("ffmpeg", cmd.output()).map(|_| ())
    }

    fn extract_frame(&self, input: &Path, timecode: &Timecode) -> ItemResult<DynamicImage> {
        let frame = tempfile::Builder::new()
            .prefix("mediashelf-frame-")
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| ItemError::io("create temporary file for", input, e))?;

        let mut cmd = self.ffmpeg()?;
        cmd.arg("-i")
            .arg(input)
            .args(["-y", "-an", "-ss"])
            .arg(timecode.to_string())
            .args(["-r", "1", "-vframes", "1"])
            .arg(frame.path());
        check("ffmpeg", cmd.output())?;

        Ok(image::open(frame.path())?)
    }
}

fn check(tool: &'static str, output: std::io::Result<Output>) -> ItemResult<Output> {
    let output = output.map_err(|e| ItemError::tool(tool, e.to_string()))?;
    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(ItemError::tool(
            tool,
            format!("{} {}", output.status, stderr.trim()).trim().to_string(),
        ))
    }
}
