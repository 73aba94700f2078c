//! Configuration management for procdecloak.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, OutputFormat};
use procdecloak::process::{ScanOptions, DEFAULT_PROC_ROOT, MAX_PID};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_VERIFY_DELAY_MS: u64 = 1000;
pub const MAX_VERIFY_DELAY_MS: u64 = 60_000;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Enhanced configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Process filesystem
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,

    // Scan
    #[serde(alias = "max-pid")]
    pub max_pid: Option<i32>,
    #[serde(alias = "verify-race")]
    pub verify_race: Option<bool>,
    #[serde(alias = "verify-delay-ms")]
    pub verify_delay_ms: Option<u64>,
    pub parallelism: Option<usize>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    // Output
    #[serde(alias = "output-format")]
    pub output_format: Option<OutputFormat>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            max_pid: Some(MAX_PID),
            verify_race: Some(true),
            verify_delay_ms: Some(DEFAULT_VERIFY_DELAY_MS),
            parallelism: Some(1),
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
            output_format: Some(OutputFormat::Text),
        }
    }
}

impl Config {
    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format.unwrap_or(OutputFormat::Text)
    }

    pub fn verify_delay(&self) -> Duration {
        Duration::from_millis(self.verify_delay_ms.unwrap_or(DEFAULT_VERIFY_DELAY_MS))
    }

    /// Scan options derived from the effective configuration.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_pid: self.max_pid.unwrap_or(MAX_PID),
            verify_race: self.verify_race.unwrap_or(true),
            verify_delay: self.verify_delay(),
            parallelism: self.parallelism.unwrap_or(1),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("max_pid must be between 2 and {} (got {0})", MAX_PID)]
    MaxPidOutOfRange(i32),

    #[error("proc_root must not be empty")]
    EmptyProcRoot,

    #[error("verify_delay_ms must not exceed {} (got {0})", MAX_VERIFY_DELAY_MS)]
    VerifyDelayTooLong(u64),

    #[error("Invalid log_level '{0}', expected off, error, warn, info, debug or trace")]
    InvalidLogLevel(String),
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(max_pid) = cfg.max_pid {
        if !(2..=MAX_PID).contains(&max_pid) {
            return Err(ConfigError::MaxPidOutOfRange(max_pid));
        }
    }

    if cfg
        .proc_root
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(ConfigError::EmptyProcRoot);
    }

    if let Some(delay) = cfg.verify_delay_ms {
        if delay > MAX_VERIFY_DELAY_MS {
            return Err(ConfigError::VerifyDelayTooLong(delay));
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if crate::cli::LogLevel::from_name(level).is_none() {
            return Err(ConfigError::InvalidLogLevel(level.to_string()));
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(max_pid) = args.max_pid {
        config.max_pid = Some(max_pid);
    }
    if args.no_verify {
        config.verify_race = Some(false);
    }
    if let Some(delay) = args.verify_delay_ms {
        config.verify_delay_ms = Some(delay);
    }
    if let Some(threads) = args.parallelism {
        config.parallelism = Some(threads);
    }
    if let Some(format) = args.format {
        config.output_format = Some(format);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(format!("{level:?}").to_lowercase());
    }

    Ok(config)
}

/// Searched in order when no config file is given.
pub const DEFAULT_CONFIG_LOCATIONS: [&str; 8] = [
    "/etc/procdecloak/procdecloak.yaml",
    "/etc/procdecloak/procdecloak.yml",
    "/etc/procdecloak/procdecloak.json",
    "/etc/procdecloak/procdecloak.toml",
    "./procdecloak.yaml",
    "./procdecloak.yml",
    "./procdecloak.json",
    "./procdecloak.toml",
];

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            match DEFAULT_CONFIG_LOCATIONS.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()).into());
    }

    let content = fs::read_to_string(&path)?;
    let config = parse_config(&content, path.extension().and_then(|s| s.to_str()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config content, choosing the format by file extension (YAML by default).
/// Missing keys keep their defaults.
pub fn parse_config(
    content: &str,
    extension: Option<&str>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let partial: Config = match extension {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(merge_with_defaults(partial))
}

fn merge_with_defaults(partial: Config) -> Config {
    let d = Config::default();
    Config {
        proc_root: partial.proc_root.or(d.proc_root),
        max_pid: partial.max_pid.or(d.max_pid),
        verify_race: partial.verify_race.or(d.verify_race),
        verify_delay_ms: partial.verify_delay_ms.or(d.verify_delay_ms),
        parallelism: partial.parallelism.or(d.parallelism),
        log_level: partial.log_level.or(d.log_level),
        output_format: partial.output_format.or(d.output_format),
    }
}

/// Renders configuration in the requested format
pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}
