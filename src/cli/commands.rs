//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Workday HR connector CLI
#[derive(Parser, Debug)]
#[command(name = "workday-connector")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// State file (JSON)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List feeds with their request template and fan-out
    Feeds,

    /// Build the request envelope for one page of a feed
    Request {
        /// Feed name
        feed: String,

        #[command(flatten)]
        params: PartitionArgs,

        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Normalize a saved response into records
    Normalize {
        /// Feed name
        feed: String,

        /// Response body file
        #[arg(short, long)]
        response: PathBuf,

        /// HTTP status the response came with
        #[arg(long, default_value = "200")]
        status: u16,

        #[command(flatten)]
        params: PartitionArgs,

        /// Parquet file to write (with `--format parquet`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for decoded worker photos (overrides config)
        #[arg(long)]
        photo_dir: Option<PathBuf>,
    },

    /// List the sub-requests a feed fans out into
    Partitions {
        /// Feed name
        feed: String,

        /// Records of the `workers` feed (JSON array or JSON lines)
        #[arg(short, long)]
        workers: Option<PathBuf>,

        /// Last day to slice (YYYY-MM-DD, default today)
        #[arg(long)]
        today: Option<String>,

        /// Continue the current run, skipping partitions already fetched
        #[arg(long)]
        resume: bool,
    },
}

/// Sub-request values shared by `request` and `normalize`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PartitionArgs {
    /// Worker identifier
    #[arg(long)]
    pub worker_id: Option<String>,

    /// As-of effective date (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<String>,

    /// Reference category token
    #[arg(long)]
    pub subcategory: Option<String>,
}

impl PartitionArgs {
    /// Whether any value was given
    pub fn is_empty(&self) -> bool {
        self.worker_id.is_none() && self.as_of.is_none() && self.subcategory.is_none()
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
    /// Parquet files
    Parquet,
}
