use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use mediashelf::config::Config;
use mediashelf::error::SetupError;
use mediashelf::logging;
use mediashelf::organize::{self, SortOptions};
use mediashelf::placement::{MusicRules, PhotoRules, Rules};
use mediashelf::scanner::WalkOptions;
use mediashelf::tags::{ExifReader, ExifTool, TagReader};
use mediashelf::tasks::Summary;

/// Sort music and photo libraries by their metadata.
#[derive(Parser, Debug)]
#[command(name = "mediashelf", version, about)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log every file (-v) or everything (-vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sort music into <Letter>/<Artist>/<Album>/<Track> <Title>
    Music(SortArgs),
    /// Sort photos and videos into <Year>/<MM Month>/<Date>_<Name>
    Photos(SortArgs),
    /// Print the effective configuration
    Config {
        /// Write it to the config file instead
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug)]
struct SortArgs {
    /// Directory to scan, or a single file to rename
    path: PathBuf,

    /// Destination root (default: the scanned directory)
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long)]
    threads: Option<usize>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recurse: bool,

    /// Remove empty directories afterwards (with --recurse)
    #[arg(long, visible_alias = "rm")]
    squash: bool,

    /// Write a JSON summary of the run to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

impl SortArgs {
    fn options(&self, config: &Config, walk: WalkOptions) -> SortOptions {
        SortOptions {
            root: self.path.clone(),
            out_dir: self.out.clone(),
            threads: self.threads.unwrap_or(config.threads),
            squash: self.squash,
            walk: WalkOptions {
                recursive: self.recurse,
                ..walk
            },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    logging::init(cli.verbose, config.log_dir.as_deref())?;

    match &cli.command {
        Command::Music(args) => sort_music(args, &config),
        Command::Photos(args) => sort_photos(args, &config),
        Command::Config { save } => {
            if *save {
                let path = config.save(cli.config.as_deref())?;
                tracing::info!("Configuration written to {}", path.display());
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn sort_music(args: &SortArgs, config: &Config) -> Result<ExitCode> {
    let reader = ExifTool::locate().ok_or(SetupError::ToolMissing("exiftool"))?;

    let walk = WalkOptions {
        extensions: config.music.extensions.clone(),
        skip_hidden: true,
        ..WalkOptions::default()
    };
    let options = args.options(config, walk);

    let summary = organize::run(Rules::Music(MusicRules), Arc::new(reader), &options)?;
    finish(&summary, args.report.as_deref())
}

fn sort_photos(args: &SortArgs, config: &Config) -> Result<ExitCode> {
    let reader: Arc<dyn TagReader> = match ExifTool::locate() {
        Some(exiftool) => Arc::new(exiftool),
        None => {
            tracing::warn!("exiftool not available in PATH, reading capture dates from EXIF only");
            Arc::new(ExifReader)
        }
    };

    let rules = PhotoRules::with_month_names(&config.photos.month_names)
        .context("photos.month_names must list exactly 12 names")?;

    let walk = WalkOptions {
        extensions: config.photos.extensions.clone(),
        ignored_names: config.photos.ignored_files.clone(),
        skip_hidden: true,
        excluded_dir: Some(config.photos.thumb_dir.clone()),
        ..WalkOptions::default()
    };
    let options = args.options(config, walk);

    let summary = organize::run(Rules::Photo(rules), reader, &options)?;
    finish(&summary, args.report.as_deref())
}

fn finish(summary: &Summary, report: Option<&Path>) -> Result<ExitCode> {
    summary.log();
    if let Some(path) = report {
        summary.write_json(path)?;
        tracing::info!("Report written to {}", path.display());
    }
    Ok(summary.exit_code())
}
