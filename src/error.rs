//! Error types shared by the process readers and the hidden-PID detector.

use crate::process::{Pid, MAX_PID, MIN_PID};
use std::io;

/// Errors produced while reading `/proc` records or evaluating a PID.
#[derive(Debug, thiserror::Error)]
pub enum DecloakError {
    /// PID outside `[MIN_PID, MAX_PID]`. Raised before any I/O.
    #[error("PID must be between {} and {} (got {pid})", MIN_PID, MAX_PID)]
    InvalidArgument { pid: Pid },

    /// The per-process resource does not exist (process gone or never existed).
    #[error("{resource} for PID {pid} not found")]
    NotFound { pid: Pid, resource: &'static str },

    /// The per-process resource exists but could not be read.
    #[error("cannot read {resource} for PID {pid}: {source}")]
    Unreadable {
        pid: Pid,
        resource: &'static str,
        #[source]
        source: io::Error,
    },

    /// A status line violates the `key: value` shape or a numeric field does not parse.
    #[error("malformed status record: {0}")]
    MalformedRecord(String),

    /// The process root directory listing could not be read.
    #[error("error reading the {root} directory to find hidden PIDs: {source}")]
    ListingFailed {
        root: String,
        #[source]
        source: io::Error,
    },
}

impl DecloakError {
    /// Wraps an I/O failure on a per-PID resource, separating "gone" from "unreadable".
    pub fn from_io(pid: Pid, resource: &'static str, err: io::Error) -> Self {
        // ESRCH shows up when the task exits while its files are being opened
        let vanished = err.kind() == io::ErrorKind::NotFound || err.raw_os_error() == Some(3);
        if vanished {
            DecloakError::NotFound { pid, resource }
        } else {
            DecloakError::Unreadable {
                pid,
                resource,
                source: err,
            }
        }
    }

    /// True for per-PID read failures that brute-force scanning expects and swallows.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DecloakError::NotFound { .. } | DecloakError::Unreadable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DecloakError>;
