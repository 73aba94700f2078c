//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from(match format {
            ConfigFormat::Yaml => "procdecloak.yaml",
            ConfigFormat::Json => "procdecloak.json",
            ConfigFormat::Toml => "procdecloak.toml",
        }),
    };

    let mut content = render_config(&config, format)?;
    if matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# procdecloak Configuration
# =========================
#
# proc_root: "/proc"           # Process filesystem root
# max_pid: 4194304             # Exclusive upper bound of the PID sweep
# verify_race: true            # Re-check flagged PIDs once after a delay
# verify_delay_ms: 1000        # Delay before the re-check
# parallelism: 1               # Scan workers (1 = sequential, 0 = one per CPU)
# log_level: "warn"            # off, error, warn, info, debug, trace
# output_format: "text"        # text or json
"#;

    format!("{comments}\n{yaml}")
}
