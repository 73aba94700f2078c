//! CLI arguments and subcommands for procdecloak.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Report format for scan, check and status output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "procdecloak",
    about = "Decloak Process IDs hidden by Linux stealth rootkits",
    long_about = "Decloak Process IDs hidden by Linux stealth rootkits.\n\n\
                  Brute-forces every PID, proves each one exists through its maps and \
                  status records, and flags PIDs that cannot be stat'ed or are missing \
                  from the /proc directory listing.",
    version = crate::VERSION,
    long_version = crate::LONG_VERSION,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Process filesystem root
    #[arg(long, global = true)]
    pub proc_root: Option<PathBuf>,

    /// Exclusive upper bound of the PID sweep
    #[arg(long, global = true)]
    pub max_pid: Option<i32>,

    /// Do not re-verify flagged PIDs after a delay
    #[arg(long, global = true)]
    pub no_verify: bool,

    /// Delay before re-verifying a flagged PID, in milliseconds
    #[arg(long, global = true)]
    pub verify_delay_ms: Option<u64>,

    /// Scan worker threads (1 = sequential, 0 = one per CPU)
    #[arg(short = 'j', long, global = true)]
    pub parallelism: Option<usize>,

    /// Report format
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the whole PID space for hidden processes (default)
    Scan,

    /// Check a single PID
    Check {
        /// PID to evaluate
        #[arg(short = 'p', long)]
        pid: i32,
    },

    /// Print the parsed status record of a PID
    Status {
        /// PID to read
        #[arg(short = 'p', long)]
        pid: i32,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },

    /// Check runtime requirements and permissions
    CheckRequirements,
}
