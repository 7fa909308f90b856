//! Thumbnail generator for Synology Photo Station.
//!
//! Walks a photo tree and writes the `@eaDir` thumbnail cache Photo Station
//! reads, so the NAS does not have to render previews itself. Optionally
//! mirrors the result to the NAS afterwards.
//!
//! ## Usage
//!
//! ```bash
//! mediashelf-thumbs ~/Pictures                  # Generate missing thumbnails
//! mediashelf-thumbs -f -t 8 ~/Pictures          # Regenerate everything
//! mediashelf-thumbs ~/Pictures --sync nas:/volume1/photo --sync-scope t
//! ```

use anyhow::Result;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use mediashelf::config::Config;
use mediashelf::logging;
use mediashelf::sync::{self, SyncScope};
use mediashelf::thumbs::{self, ExternalTools, MediaClasses, ThumbOptions, Timecode};

/// Generate thumbnails for Synology Photo Station.
#[derive(Parser, Debug)]
#[command(name = "mediashelf-thumbs", version, about)]
struct Cli {
    /// Directory with images to generate thumbnails of
    dir: PathBuf,

    /// Regenerate thumbnails that already exist
    #[arg(short, long)]
    force: bool,

    /// Number of worker threads
    #[arg(short, long)]
    threads: Option<usize>,

    /// Length of video previews in seconds
    #[arg(long, value_name = "SECONDS")]
    video_duration: Option<u32>,

    /// Position of the frame used for video thumbnails
    #[arg(long, value_name = "HH:MM:SS")]
    video_timecode: Option<Timecode>,

    /// Mirror the tree to this rsync destination afterwards
    #[arg(long, value_name = "DEST")]
    sync: Option<String>,

    /// What to mirror: thumbnails (t), photos (p) or both (tp)
    #[arg(long, value_enum)]
    sync_scope: Option<SyncScope>,

    /// Write a JSON summary of the run to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Log every file (-v) or everything (-vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    fn options(&self, config: &Config) -> Result<ThumbOptions> {
        let video_timecode = match &self.video_timecode {
            Some(timecode) => timecode.clone(),
            None => config.thumbnails.video_timecode.parse()?,
        };

        Ok(ThumbOptions {
            root: self.dir.clone(),
            threads: self.threads.unwrap_or(config.threads),
            force: self.force,
            quality: config.thumbnails.quality,
            video_duration: self.video_duration.unwrap_or(config.thumbnails.video_duration),
            video_timecode,
            thumb_dir: config.photos.thumb_dir.clone(),
            classes: MediaClasses {
                image: config.thumbnails.image_extensions.clone(),
                raw: config.thumbnails.raw_extensions.clone(),
                video: config.thumbnails.video_extensions.clone(),
            },
            ignored_names: config.thumbnails.ignored_files.clone(),
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    logging::init(cli.verbose, config.log_dir.as_deref())?;

    let options = cli.options(&config)?;
    let tools = ExternalTools::probe();
    let capabilities = tools.capabilities();

    let summary = thumbs::run(&options, Arc::new(tools), capabilities)?;
    summary.log();
    if let Some(path) = &cli.report {
        summary.write_json(path)?;
        tracing::info!("Report written to {}", path.display());
    }

    if let Some(destination) = &cli.sync {
        let scope = cli.sync_scope.unwrap_or(config.sync.scope);
        sync::mirror(
            &options.root,
            destination,
            scope,
            &options.thumb_dir,
            config.sync.iconv.as_deref(),
        )?;
    }

    Ok(summary.exit_code())
}
