//! Scan command implementation.
//!
//! Sweeps the PID space and reports every hidden PID with its name.

use anyhow::Context;
use procdecloak::process::{get_process_status, Pid, ProcFs, ProcessRecord, Scanner};
use serde::Serialize;
use std::io::Write;

use crate::cli::OutputFormat;
use crate::config::Config;

/// One hidden PID with the status record read after the scan.
#[derive(Debug, Serialize)]
pub struct HiddenPid {
    pub pid: Pid,
    pub status: ProcessRecord,
}

/// JSON report of a scan.
#[derive(Debug, Serialize)]
pub struct ScanOutput {
    pub hidden: Vec<HiddenPid>,
    pub scanned: usize,
    pub errors: usize,
    pub elapsed_seconds: f64,
}

/// Runs the sweep and prints the report.
///
/// A status lookup failure for a PID already confirmed hidden is fatal.
pub fn command_scan(config: &Config) -> anyhow::Result<()> {
    let format = config.output_format();
    if format == OutputFormat::Text {
        print_banner();
    }

    let source = ProcFs::new(config.proc_root());
    let report = Scanner::new(&source, config.scan_options()).scan();

    let mut hidden = Vec::with_capacity(report.hidden.len());
    for &pid in &report.hidden {
        let status = get_process_status(&source, pid)
            .with_context(|| format!("error reporting status on hidden PID {pid}"))?;
        hidden.push(HiddenPid { pid, status });
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Text => write_text_report(&mut out, &hidden)?,
        OutputFormat::Json => {
            let output = ScanOutput {
                hidden,
                scanned: report.scanned,
                errors: report.errors,
                elapsed_seconds: report.elapsed.as_secs_f64(),
            };
            serde_json::to_writer_pretty(&mut out, &output)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn print_banner() {
    println!("procdecloak Version {}", crate::VERSION);
    println!("Copyright (c) 2024 Herakles IO\n");
    println!("Decloaking hidden Process IDs (PIDS) on Linux host.");
}

/// Writes the human-readable report lines.
pub fn write_text_report<W: Write>(out: &mut W, hidden: &[HiddenPid]) -> std::io::Result<()> {
    if hidden.is_empty() {
        writeln!(out, "No hidden PIDs found.")?;
        return Ok(());
    }
    for entry in hidden {
        writeln!(
            out,
            "Found hidden PID: {} with name: {}",
            entry.pid, entry.status.name
        )?;
    }
    Ok(())
}
