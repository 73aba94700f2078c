//! procdecloak library
//!
//! Detects Linux process IDs concealed by kernel-level stealth rootkits. A PID
//! is reported hidden when its existence is proven through `/proc/<pid>/maps`
//! and `/proc/<pid>/status`, yet `/proc/<pid>` cannot be `lstat`ed or is
//! missing from the `/proc` directory listing.
//!
//! # Usage
//!
//! ```rust,no_run
//! use procdecloak::process::{get_process_status, scan_for_hidden_pids, ProcFs};
//!
//! let proc_fs = ProcFs::default();
//! for pid in scan_for_hidden_pids(&proc_fs) {
//!     let status = get_process_status(&proc_fs, pid).expect("status of hidden PID");
//!     println!("Found hidden PID: {} with name: {}", pid, status.name);
//! }
//! ```
//!
//! Single PIDs can be evaluated with [`process::Detector`], which also exposes
//! the three-valued [`process::Verdict`].

pub mod error;
pub mod process;

// Re-export main types for convenience
pub use error::{DecloakError, Result};
pub use process::{
    check_pid_hidden, get_process_status, scan_for_hidden_pids, Detector, Pid, ProcFs,
    ProcSource, ProcessRecord, Verdict,
};
