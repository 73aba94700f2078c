//! Check command implementation.
//!
//! Evaluates a single PID and prints the verdict.

use procdecloak::process::{Detector, Pid, ProcFs, Verdict};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::config::Config;

#[derive(Debug, Serialize)]
struct CheckOutput {
    pid: Pid,
    verdict: Verdict,
    hidden: bool,
}

/// Evaluates one PID with the configured race verification.
pub fn command_check(pid: Pid, config: &Config) -> anyhow::Result<()> {
    let source = ProcFs::new(config.proc_root());
    let verdict = Detector::new(&source)
        .with_verify_delay(config.verify_delay())
        .check(pid, config.verify_race.unwrap_or(true))?;

    match config.output_format() {
        OutputFormat::Text => println!("PID {pid}: {verdict}"),
        OutputFormat::Json => {
            let output = CheckOutput {
                pid,
                verdict,
                hidden: verdict.is_hidden(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
