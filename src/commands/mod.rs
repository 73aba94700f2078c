//! CLI command implementations for procdecloak.
//!
//! This module provides implementations for all CLI subcommands:
//! - `scan`: Full-range hidden PID sweep (default)
//! - `check`: Single PID evaluation
//! - `status`: Parsed status record of a PID
//! - `config`: Configuration file generation

pub mod check;
pub mod config;
pub mod scan;
pub mod status;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use scan::command_scan;
pub use status::command_status;
