//! Command line arguments
//!
//! Every option is optional here so that unset flags fall through to the
//! environment, the configuration file and finally the built-in defaults.

use crate::core::logging::{LOG_FORMATS, LOG_LEVELS};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "org-inventory")]
#[command(about = "Inventory resources across every account in an AWS Organization")]
#[command(version, long_version = crate::core::version::long_version())]
#[command(after_help = " * can be specified multiple times or as a comma-separated list")]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Role assumed in each member account
    #[arg(short = 'r', long = "role-name", value_name = "ROLE")]
    pub role_name: Option<String>,

    /// Regions to scan*
    #[arg(short = 'R', long = "regions", value_name = "REGIONS", action = ArgAction::Append)]
    pub regions: Vec<String>,

    /// Maximum work units running at once
    #[arg(short = 'j', long = "max-concurrency", value_name = "COUNT")]
    pub max_concurrency: Option<String>,

    /// Account ids to skip*
    #[arg(short = 'x', long = "exclude-accounts", value_name = "IDS", action = ArgAction::Append)]
    pub exclude_accounts: Vec<String>,

    /// Lifetime of delegated credentials in seconds (900-43200)
    #[arg(long = "session-duration", value_name = "SECONDS")]
    pub session_duration: Option<String>,

    /// Abandon a single scanner invocation after this many seconds
    #[arg(short = 't', long = "unit-timeout", value_name = "SECONDS")]
    pub unit_timeout: Option<String>,

    /// Directory receiving report files
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Report formats (csv, json)*
    #[arg(short = 'F', long = "format", value_name = "FORMATS", action = ArgAction::Append)]
    pub formats: Vec<String>,

    /// Upload report files to this S3 bucket
    #[arg(long = "s3-bucket", value_name = "BUCKET")]
    pub s3_bucket: Option<String>,

    /// Key prefix for uploaded report files
    #[arg(long = "s3-prefix", value_name = "PREFIX")]
    pub s3_prefix: Option<String>,

    /// Failures listed on the console before truncating
    #[arg(long = "error-display-limit", value_name = "COUNT")]
    pub error_display_limit: Option<String>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = LOG_LEVELS)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", value_parser = LOG_FORMATS)]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'L', long = "log-file", value_name = "FILE")]
    pub log_file: Option<String>,

    /// Force coloured output
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable coloured output
    #[arg(long = "no-color", conflicts_with = "color")]
    pub no_color: bool,

    /// More log output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Less log output (repeatable)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,

    /// List the registered scanners and exit
    #[arg(long = "list-scanners")]
    pub list_scanners: bool,
}

impl Args {
    /// `Some(true)` for `--color`, `Some(false)` for `--no-color`
    pub fn color_choice(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
