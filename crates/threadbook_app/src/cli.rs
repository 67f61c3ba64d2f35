use std::path::PathBuf;

use book_logging::LogDestination;
use clap::Parser;
use log::LevelFilter;

/// Builds e-books from an archived forum thread corpus.
#[derive(Debug, Clone, Parser)]
#[command(name = "threadbook", version, about)]
pub struct Args {
    /// Corpus root holding `posts/<thread id>/post.json` and `replies.json`.
    #[arg(long, default_value = "glowpub_cache")]
    pub corpus: PathBuf,

    /// Book plan (RON): metadata, chapters, exclusions and profiles.
    #[arg(long, default_value = "config/book.ron")]
    pub plan: PathBuf,

    /// Directory the profile outputs are written to.
    #[arg(long, default_value = "out")]
    pub out: PathBuf,

    #[arg(long, default_value = "image_cache")]
    pub image_cache: PathBuf,

    /// Directory of `<icon id>.<ext>` avatar files.
    #[arg(long)]
    pub avatars: Option<PathBuf>,

    /// PNG used for the cover and title page.
    #[arg(long)]
    pub cover: Option<PathBuf>,

    /// Profile to build; repeat for several. Builds all profiles when omitted.
    #[arg(long = "profile", value_name = "NAME")]
    pub profiles: Vec<String>,

    /// Use only images already in the cache.
    #[arg(long)]
    pub offline: bool,

    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
