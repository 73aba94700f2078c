//! Process introspection and hidden-PID detection.
//!
//! This module provides:
//! - `source`: Access primitives over `/proc` (`ProcSource`, `ProcFs`)
//! - `status`: Parsing of `/proc/<pid>/status`
//! - `maps`: Reading of `/proc/<pid>/maps`
//! - `detector`: The per-PID hidden check with race re-verification
//! - `scanner`: Brute-force sweep of the PID space

pub mod detector;
pub mod maps;
pub mod scanner;
pub mod source;
pub mod status;

use crate::error::{DecloakError, Result};

/// Kernel process identifier (`pid_t`).
pub type Pid = i32;

/// Lowest PID accepted by any check.
pub const MIN_PID: Pid = 1;

/// Highest PID accepted by any check. 64-bit Linux caps `pid_max` at 2^22.
pub const MAX_PID: Pid = 4_194_304;

/// Rejects PIDs outside `[MIN_PID, MAX_PID]`.
pub fn validate_pid(pid: Pid) -> Result<()> {
    if (MIN_PID..=MAX_PID).contains(&pid) {
        Ok(())
    } else {
        Err(DecloakError::InvalidArgument { pid })
    }
}

// Re-export commonly used types
pub use detector::{check_pid_hidden, Detector, PidListing, Verdict, HIDDEN_VERIFY_DELAY};
pub use maps::read_memory_maps;
pub use scanner::{scan_for_hidden_pids, ScanOptions, ScanReport, Scanner};
pub use source::{ProcFs, ProcSource, DEFAULT_PROC_ROOT};
pub use status::{get_process_status, parse_status, ProcessRecord};
