use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::content::{CategoryId, ContentId};
use crate::types::DispositionRule;

/// postsweep - find stale posts and archive or delete them
#[derive(Parser)]
#[command(name = "postsweep")]
#[command(about = "Finds stale, low-engagement content and archives or deletes it")]
#[command(version)]
pub struct Cli {
    /// Path to the maintenance configuration file
    #[arg(short, long, global = true, default_value = "postsweep.json")]
    pub config: PathBuf,

    /// Dry-run mode: report what would change without touching the store.
    ///
    /// Matching, stamping and validation still run so the preview is
    /// realistic; no item is archived, deleted or stamped and no
    /// notification is sent.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a manual scan with explicit criteria
    Scan {
        /// Post types to include (repeatable or comma-separated)
        #[arg(short, long = "post-type", value_delimiter = ',', default_value = "post")]
        post_type: Vec<String>,
        /// Restrict to these category IDs (repeatable or comma-separated)
        #[arg(long, value_delimiter = ',')]
        category: Vec<CategoryId>,
        /// Minimum age in days (defaults to the configured schedule)
        #[arg(short, long)]
        age_threshold: Option<i64>,
        /// Views or comments below this count as low engagement
        #[arg(short, long)]
        engagement_threshold: Option<i64>,
        /// What to do with matches (archive or delete)
        #[arg(short, long)]
        rule: Option<DispositionRule>,
    },
    /// Run the configured schedule, as a cron job would
    Scheduled,
    /// Feed a JSON request body through the invocation handler
    Request {
        /// Path to a JSON file, or - for stdin
        input: String,
    },
    /// Record the current time as the last scan time of published items
    Stamp {
        /// Post types to stamp (repeatable or comma-separated)
        #[arg(short, long = "post-type", value_delimiter = ',', default_value = "post")]
        post_type: Vec<String>,
        /// Only items published after this date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// Only items published before this date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Only these item IDs (comma-separated)
        #[arg(long, value_delimiter = ',')]
        post_ids: Vec<ContentId>,
        /// Print every stamped item
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show the cached result of the latest scan
    LastResult,
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
