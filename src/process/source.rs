//! Access primitives over the process filesystem.
//!
//! The detector never touches the filesystem directly; it goes through
//! [`ProcSource`] so that the probes can be exercised against synthetic
//! process tables in tests.

use crate::process::Pid;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Default process filesystem mount point.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// The four primitives the detector consumes.
pub trait ProcSource {
    /// Lines of `<root>/<pid>/status`.
    fn read_status(&self, pid: Pid) -> io::Result<Vec<String>>;

    /// Lines of `<root>/<pid>/maps`.
    fn read_maps(&self, pid: Pid) -> io::Result<Vec<String>>;

    /// `lstat` of `<root>/<pid>`, without following symlinks.
    fn stat_pid(&self, pid: Pid) -> io::Result<()>;

    /// Entry names of `<root>`.
    fn list_root(&self) -> io::Result<Vec<String>>;

    /// Human-readable root, used in error messages.
    fn root_display(&self) -> String;
}

/// Live `/proc` (or any directory laid out like it).
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pid_path(&self, pid: Pid) -> PathBuf {
        self.root.join(pid.to_string())
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

/// Reads a whole file as a vector of lines.
///
/// Process names and mapped paths may carry arbitrary bytes, so lines are
/// decoded lossily instead of rejecting the file.
fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    reader
        .split(b'\n')
        .map(|line| {
            let mut line = line?;
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            Ok(String::from_utf8_lossy(&line).into_owned())
        })
        .collect()
}

impl ProcSource for ProcFs {
    fn read_status(&self, pid: Pid) -> io::Result<Vec<String>> {
        read_lines(&self.pid_path(pid).join("status"))
    }

    fn read_maps(&self, pid: Pid) -> io::Result<Vec<String>> {
        read_lines(&self.pid_path(pid).join("maps"))
    }

    fn stat_pid(&self, pid: Pid) -> io::Result<()> {
        fs::symlink_metadata(self.pid_path(pid)).map(|_| ())
    }

    fn list_root(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn root_display(&self) -> String {
        self.root.display().to_string()
    }
}
