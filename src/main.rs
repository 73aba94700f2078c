//! procdecloak - version 0.1.0
//!
//! Hidden process decloaking tool with tracing logging.
//! This is the main entry point that resolves configuration and dispatches subcommands.

mod cli;
mod commands;
mod config;
mod startup_checks;

use clap::Parser;
use tracing::{error, info, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_scan, command_status};
use config::{resolve_config, show_config, validate_effective_config, Config, DEFAULT_LOG_LEVEL};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    ")"
);

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config) {
    let level = config
        .log_level
        .as_deref()
        .and_then(LogLevel::from_name)
        .or_else(|| LogLevel::from_name(DEFAULT_LOG_LEVEL))
        .unwrap_or(LogLevel::Warn);

    let max_level = match level {
        LogLevel::Off => return,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    // Reports go to stdout, diagnostics to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Main application entry point.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Config generation does not need the effective config
    if let Some(Commands::Config { output, format }) = &args.command {
        return command_config(output.clone(), *format);
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config);

    let result = match args.command.as_ref() {
        None | Some(Commands::Scan) => {
            if let Err(e) = startup_checks::validate_requirements(&config.proc_root()) {
                error!("❌ Startup validation failed: {}", e);
                error!("   The scan will run but may miss processes!");
            }
            command_scan(&config)
        }
        Some(Commands::Check { pid }) => command_check(*pid, &config),
        Some(Commands::Status { pid }) => command_status(*pid, &config),
        Some(Commands::CheckRequirements) => {
            println!("🔍 Checking Runtime Requirements");
            println!("================================\n");

            match startup_checks::validate_requirements(&config.proc_root()) {
                Ok(_) => {
                    println!("\n✅ All requirements met - ready to scan!");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("\n❌ Requirements check failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Config { .. }) => unreachable!("Config handled above"),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
