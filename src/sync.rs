//! Mirroring a processed tree to another location with rsync.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use crate::error::SetupError;

/// What part of the tree is mirrored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum SyncScope {
    /// Only the thumbnail directories.
    #[serde(rename = "t")]
    #[value(name = "t")]
    Thumbnails,
    /// Everything except the thumbnail directories.
    #[serde(rename = "p")]
    #[value(name = "p")]
    Photos,
    /// The whole tree.
    #[default]
    #[serde(rename = "tp")]
    #[value(name = "tp")]
    Both,
}

/// Arguments for `rsync` mirroring `source` into `destination`.
pub fn rsync_args(
    source: &Path,
    destination: &str,
    scope: SyncScope,
    thumb_dir: &str,
    iconv: Option<&str>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-au".into(), "--prune-empty-dirs".into()];
    if let Some(iconv) = iconv {
        args.push(format!("--iconv={}", iconv).into());
    }

    match scope {
        SyncScope::Thumbnails => {
            args.push("--include=*/".into());
            args.push(format!("--include={}/**", thumb_dir).into());
            args.push("--exclude=*".into());
        }
        SyncScope::Photos => args.push(format!("--exclude={}/", thumb_dir).into()),
        SyncScope::Both => {}
    }

    // Trailing slash: copy the contents of the root, not the root itself.
    let mut source = source.as_os_str().to_os_string();
    if !source.to_string_lossy().ends_with('/') {
        source.push("/");
    }
    args.push(source);
    args.push(destination.into());
    args
}

/// Run rsync, failing if it is missing or exits unsuccessfully.
pub fn mirror(
    source: &Path,
    destination: &str,
    scope: SyncScope,
    thumb_dir: &str,
    iconv: Option<&str>,
) -> Result<()> {
    let rsync = which::which("rsync").map_err(|_| SetupError::ToolMissing("rsync"))?;
    let args = rsync_args(source, destination, scope, thumb_dir, iconv);

    tracing::info!(source = %source.display(), destination, ?scope, "Syncing");
    tracing::debug!(?args, "rsync arguments");

    let status = Command::new(&rsync)
        .args(&args)
        .status()
        .with_context(|| format!("running {}", rsync.display()))?;
    if !status.success() {
        anyhow::bail!("rsync exited with {}", status);
    }

    tracing::info!("Sync finished");
    Ok(())
}
