use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cachephoenix")]
#[command(author, version, about = "Recover media from Chromium-family browser disk caches")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a cache directory and list recoverable resources
    Scan {
        /// Cache directory to scan
        #[arg(required = true)]
        dir: PathBuf,

        /// Output the resource catalogue as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan a cache directory and recover resources into an output folder
    Recover {
        /// Cache directory to scan
        #[arg(required = true)]
        dir: PathBuf,

        /// Output directory for recovered files
        #[arg(short, long)]
        output: PathBuf,

        /// Recover only these resource ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u32>,

        /// Recover only these categories: image, video, audio
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,

        /// Also recover the unidentified-data tail resource
        #[arg(long)]
        include_unknown: bool,
    },

    /// List default cache locations for installed browsers and clients
    Paths,

    /// Check that required external tools (ffmpeg, ffprobe) are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config / defaults if not given)
        config: Option<PathBuf>,
    },
}
