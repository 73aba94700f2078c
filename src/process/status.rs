//! Parsing of `/proc/<pid>/status` into a [`ProcessRecord`].

use crate::error::{DecloakError, Result};
use crate::process::source::ProcSource;
use crate::process::{validate_pid, Pid};
use serde::{Deserialize, Serialize};

/// Abbreviated process status as reported by the kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub name: String,
    pub umask: String,
    pub state: String,
    pub tgid: Pid,
    pub ngid: Pid,
    pub pid: Pid,
    pub ppid: Pid,
}

impl ProcessRecord {
    /// A record is a top-level process (not a thread of another process)
    /// when it is its own thread-group leader.
    pub fn is_top_level(&self) -> bool {
        self.pid == self.tgid && self.pid > 0
    }
}

fn parse_int(field: &str, value: &str) -> Result<Pid> {
    value.parse().map_err(|e| {
        DecloakError::MalformedRecord(format!(
            "cannot convert {field} value '{value}' to an integer: {e}"
        ))
    })
}

/// Parses status lines. Unknown keys are ignored; keys with an empty value are skipped.
pub fn parse_status<I, S>(lines: I) -> Result<ProcessRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut record = ProcessRecord::default();

    for line in lines {
        let line = line.as_ref();
        let mut parts = line.split(':');
        let key = parts.next().unwrap_or_default();
        let value = match parts.next() {
            Some(v) => v,
            None => {
                return Err(DecloakError::MalformedRecord(format!(
                    "cannot parse entry '{line}' due to incorrect length"
                )))
            }
        };

        // Only the first token counts; this drops units such as "kB"
        let first = match value.split_whitespace().next() {
            Some(v) => v,
            None => continue,
        };

        match key {
            "Name" => record.name = first.to_string(),
            "Umask" => record.umask = first.to_string(),
            "State" => record.state = first.to_string(),
            "Tgid" => record.tgid = parse_int("tgid", first)?,
            "Ngid" => record.ngid = parse_int("ngid", first)?,
            "Pid" => record.pid = parse_int("pid", first)?,
            "PPid" => record.ppid = parse_int("ppid", first)?,
            _ => {}
        }
    }

    Ok(record)
}

/// Reads and parses the status record for `pid`.
///
/// Rejects out-of-range PIDs before touching the source. Open failures come
/// back as [`DecloakError::NotFound`] or [`DecloakError::Unreadable`].
pub fn get_process_status<S: ProcSource + ?Sized>(source: &S, pid: Pid) -> Result<ProcessRecord> {
    validate_pid(pid)?;
    let lines = source
        .read_status(pid)
        .map_err(|e| DecloakError::from_io(pid, "status", e))?;
    parse_status(lines)
}
