//! Status command implementation.

use procdecloak::process::{get_process_status, Pid, ProcFs};

use crate::cli::OutputFormat;
use crate::config::Config;

/// Prints the parsed status record of `pid`. Errors are propagated, not swallowed.
pub fn command_status(pid: Pid, config: &Config) -> anyhow::Result<()> {
    let source = ProcFs::new(config.proc_root());
    let record = get_process_status(&source, pid)?;

    match config.output_format() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => {
            println!("PID:   {}", record.pid);
            println!("Name:  {}", record.name);
            println!("State: {}", record.state);
            println!("Umask: {}", record.umask);
            println!("Tgid:  {}", record.tgid);
            println!("Ngid:  {}", record.ngid);
            println!("PPid:  {}", record.ppid);
        }
    }
    Ok(())
}
