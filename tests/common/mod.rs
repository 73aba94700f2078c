//! Shared fake process table for integration tests.

#![allow(dead_code)]

use procdecloak::process::{Pid, ProcSource};
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// How a fake process behaves under the probes.
#[derive(Debug, Clone)]
pub struct FakeProc {
    pub maps: Vec<String>,
    /// `None` means the status file vanished.
    pub status: Option<Vec<String>>,
    /// Outcome of successive `lstat` calls; the last entry repeats.
    pub stat_ok: Vec<bool>,
    /// Outcome of successive appearances in the root listing; the last entry repeats.
    pub listed: Vec<bool>,
}

impl FakeProc {
    /// A normal, visible top-level process.
    pub fn visible(pid: Pid) -> Self {
        Self {
            maps: vec![format!(
                "55d0c8a00000-55d0c8a21000 r-xp 00000000 fd:01 {pid} /usr/sbin/fake"
            )],
            status: Some(status_lines(&format!("proc{pid}"), pid, pid)),
            stat_ok: vec![true],
            listed: vec![true],
        }
    }

    pub fn kernel_thread(pid: Pid) -> Self {
        Self {
            maps: Vec::new(),
            ..Self::visible(pid)
        }
    }

    pub fn thread(pid: Pid, tgid: Pid) -> Self {
        Self {
            status: Some(status_lines("worker", pid, tgid)),
            stat_ok: vec![false],
            listed: vec![false],
            ..Self::visible(pid)
        }
    }

    pub fn stat_hidden(pid: Pid) -> Self {
        Self {
            stat_ok: vec![false],
            listed: vec![false],
            ..Self::visible(pid)
        }
    }

    pub fn listing_hidden(pid: Pid) -> Self {
        Self {
            listed: vec![false],
            ..Self::visible(pid)
        }
    }
}

pub fn status_lines(name: &str, pid: Pid, tgid: Pid) -> Vec<String> {
    vec![
        format!("Name:\t{name}"),
        "Umask:\t0022".to_string(),
        "State:\tS (sleeping)".to_string(),
        format!("Tgid:\t{tgid}"),
        "Ngid:\t0".to_string(),
        format!("Pid:\t{pid}"),
        "PPid:\t1".to_string(),
        "VmRSS:\t    1024 kB".to_string(),
    ]
}

fn not_found() -> io::Error {
    io::Error::from(io::ErrorKind::NotFound)
}

fn pick(outcomes: &[bool], call: usize) -> bool {
    outcomes
        .get(call)
        .or(outcomes.last())
        .copied()
        .unwrap_or(false)
}

/// In-memory process table implementing [`ProcSource`].
#[derive(Default)]
pub struct FakeProcTable {
    procs: HashMap<Pid, FakeProc>,
    pub listing_fails: bool,
    stat_calls: Mutex<HashMap<Pid, usize>>,
    status_calls: Mutex<HashMap<Pid, usize>>,
    list_calls: AtomicUsize,
    io_calls: AtomicUsize,
}

impl FakeProcTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pid: Pid, proc: FakeProc) -> Self {
        self.procs.insert(pid, proc);
        self
    }

    pub fn stat_calls(&self, pid: Pid) -> usize {
        *self.stat_calls.lock().unwrap().get(&pid).unwrap_or(&0)
    }

    pub fn status_calls(&self, pid: Pid) -> usize {
        *self.status_calls.lock().unwrap().get(&pid).unwrap_or(&0)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Total number of primitive calls of any kind.
    pub fn io_calls(&self) -> usize {
        self.io_calls.load(Ordering::SeqCst)
    }

    fn bump(&self, counter: &Mutex<HashMap<Pid, usize>>, pid: Pid) -> usize {
        let mut map = counter.lock().unwrap();
        let n = map.entry(pid).or_insert(0);
        let before = *n;
        *n += 1;
        before
    }
}

impl ProcSource for FakeProcTable {
    fn read_status(&self, pid: Pid) -> io::Result<Vec<String>> {
        self.io_calls.fetch_add(1, Ordering::SeqCst);
        self.bump(&self.status_calls, pid);
        self.procs
            .get(&pid)
            .and_then(|p| p.status.clone())
            .ok_or_else(not_found)
    }

    fn read_maps(&self, pid: Pid) -> io::Result<Vec<String>> {
        self.io_calls.fetch_add(1, Ordering::SeqCst);
        self.procs
            .get(&pid)
            .map(|p| p.maps.clone())
            .ok_or_else(not_found)
    }

    fn stat_pid(&self, pid: Pid) -> io::Result<()> {
        self.io_calls.fetch_add(1, Ordering::SeqCst);
        let call = self.bump(&self.stat_calls, pid);
        match self.procs.get(&pid) {
            Some(p) if pick(&p.stat_ok, call) => Ok(()),
            _ => Err(not_found()),
        }
    }

    fn list_root(&self) -> io::Result<Vec<String>> {
        self.io_calls.fetch_add(1, Ordering::SeqCst);
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_fails {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        let mut names: Vec<String> = ["self", "thread-self", "sys", "meminfo"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for (pid, p) in &self.procs {
            if pick(&p.listed, call) {
                names.push(pid.to_string());
            }
        }
        Ok(names)
    }

    fn root_display(&self) -> String {
        "/fake/proc".to_string()
    }
}
