//! Startup requirement validation for procdecloak.
//!
//! Hidden processes are frequently owned by root, and a non-root scan cannot
//! read their maps. This module checks privileges and process filesystem
//! access before a scan starts.

use nix::unistd::geteuid;
use procdecloak::process::{ProcFs, ProcSource};
use std::path::Path;
use tracing::{error, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(proc_root: &Path) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges();
    check_proc_access(proc_root)?;

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check if running with sufficient privileges
fn check_user_privileges() {
    if !geteuid().is_root() {
        warn!("⚠️  Not running as root - processes owned by other users cannot be examined");
        warn!("   Recommendation: Run as root for a complete scan");
    } else {
        info!("✅ Running as root (uid=0)");
    }
}

/// Check the process root can be listed and PID 1 can be examined
fn check_proc_access(proc_root: &Path) -> Result<(), ValidationError> {
    let source = ProcFs::new(proc_root);

    match source.list_root() {
        Ok(names) if names.iter().any(|n| n == "1") => {
            info!("✅ {} is listable", proc_root.display());
        }
        Ok(_) => {
            error!("❌ {} has no entry for PID 1", proc_root.display());
            return Err(ValidationError::NotProcFs(proc_root.display().to_string()));
        }
        Err(e) => {
            error!("❌ Cannot list {}: {}", proc_root.display(), e);
            return Err(ValidationError::ProcUnreadable(e.to_string()));
        }
    }

    match source.read_maps(1) {
        Ok(_) => {
            info!("✅ Can read PID 1 memory maps");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            error!("❌ Cannot read {}/1/maps - insufficient permissions", proc_root.display());
            error!("   Only user-owned processes will be examined!");
            error!("   Solution: run as root or grant cap_sys_ptrace,cap_dac_read_search");
            Err(ValidationError::InsufficientPermissions(e.to_string()))
        }
        Err(e) => {
            warn!("⚠️  Could not test maps access: {}", e);
            Ok(())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    #[error("Process filesystem not readable: {0}")]
    ProcUnreadable(String),

    #[error("{0} does not look like a process filesystem")]
    NotProcFs(String),
}
