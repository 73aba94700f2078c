//! Reader for `/proc/<pid>/maps`.

use crate::error::{DecloakError, Result};
use crate::process::source::ProcSource;
use crate::process::{validate_pid, Pid};

/// Returns the memory-map lines of `pid` in kernel order.
///
/// An empty vector is a valid answer: kernel threads have no user mappings.
pub fn read_memory_maps<S: ProcSource + ?Sized>(source: &S, pid: Pid) -> Result<Vec<String>> {
    validate_pid(pid)?;
    source
        .read_maps(pid)
        .map_err(|e| DecloakError::from_io(pid, "maps", e))
}
