//! Hidden-PID detection.
//!
//! A PID is evaluated by proving it exists through its `maps` and `status`
//! records and then asking two independent questions about its top-level
//! `/proc` entry:
//!
//! 1. Can `<root>/<pid>` be `lstat`ed? Rootkits hooking the lookup path fail here.
//! 2. Does `<pid>` appear in the listing of `<root>`? Rootkits filtering
//!    `getdents` fail here.
//!
//! A PID that is flagged is checked a second time after [`HIDDEN_VERIFY_DELAY`]
//! so a process exiting mid-check is not reported.

use crate::error::{DecloakError, Result};
use crate::process::maps::read_memory_maps;
use crate::process::source::ProcSource;
use crate::process::status::get_process_status;
use crate::process::{validate_pid, Pid};
use ahash::AHashSet;
use serde::Serialize;
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Wait before re-verifying a flagged PID.
pub const HIDDEN_VERIFY_DELAY: Duration = Duration::from_secs(1);

/// Outcome of evaluating one PID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Proven to exist, yet missing from the lookup path or the listing.
    Hidden,
    /// Proven to exist and visible through both paths.
    NotHidden,
    /// Not a subject: no such process, no mappings, vanished mid-check, or a thread.
    NotApplicable,
}

impl Verdict {
    pub fn is_hidden(self) -> bool {
        self == Verdict::Hidden
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Hidden => "hidden",
            Verdict::NotHidden => "not hidden",
            Verdict::NotApplicable => "not applicable",
        };
        f.write_str(s)
    }
}

/// The numeric entries of the process root at one point in time.
#[derive(Debug, Clone, Default)]
pub struct PidListing {
    pids: AHashSet<Pid>,
}

impl PidListing {
    /// Reads the process root once. Failure is fatal for any check relying on it.
    pub fn capture<S: ProcSource + ?Sized>(source: &S) -> Result<Self> {
        let names = source
            .list_root()
            .map_err(|e| DecloakError::ListingFailed {
                root: source.root_display(),
                source: e,
            })?;
        Ok(Self::from_names(names))
    }

    /// Keeps names that parse as positive integers; `self`, `sys`, `0` and friends are dropped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pids = names
            .into_iter()
            .filter_map(|n| n.as_ref().parse::<Pid>().ok())
            .filter(|&p| p > 0)
            .collect();
        Self { pids }
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.pids.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }
}

/// Evaluates PIDs against a [`ProcSource`].
pub struct Detector<'a, S: ?Sized> {
    source: &'a S,
    verify_delay: Duration,
}

impl<'a, S: ProcSource + ?Sized> Detector<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            verify_delay: HIDDEN_VERIFY_DELAY,
        }
    }

    pub fn with_verify_delay(mut self, delay: Duration) -> Self {
        self.verify_delay = delay;
        self
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    /// Boolean form: `true` only for [`Verdict::Hidden`].
    pub fn check_pid_hidden(&self, pid: Pid, verify_race: bool) -> Result<bool> {
        Ok(self.check(pid, verify_race)?.is_hidden())
    }

    /// Evaluates `pid`, reading a fresh process root listing when one is needed.
    pub fn check(&self, pid: Pid, verify_race: bool) -> Result<Verdict> {
        self.check_with_listing(pid, verify_race, None)
    }

    /// Evaluates `pid`, using `listing` for the first pass if given.
    ///
    /// The retry always reads a fresh listing: a process started after the
    /// snapshot was taken must not stay flagged.
    pub fn check_with_listing(
        &self,
        pid: Pid,
        verify_race: bool,
        listing: Option<&PidListing>,
    ) -> Result<Verdict> {
        let first = self.check_once(pid, listing)?;
        if !first.is_hidden() || !verify_race {
            return Ok(first);
        }

        debug!(
            "PID {} flagged hidden, re-verifying in {:?}",
            pid, self.verify_delay
        );
        thread::sleep(self.verify_delay);

        let second = self.check_once(pid, None)?;
        if !second.is_hidden() {
            info!("PID {} cleared on re-verification ({})", pid, second);
        }
        Ok(second)
    }

    /// One pass of the check, with no retry.
    pub fn check_once(&self, pid: Pid, listing: Option<&PidListing>) -> Result<Verdict> {
        validate_pid(pid)?;

        // Most PIDs in a brute-force sweep do not exist
        let maps = match read_memory_maps(self.source, pid) {
            Ok(m) => m,
            Err(e) => {
                trace!("PID {}: {}", pid, e);
                return Ok(Verdict::NotApplicable);
            }
        };
        if maps.is_empty() {
            trace!("PID {}: no mappings, kernel thread", pid);
            return Ok(Verdict::NotApplicable);
        }

        let record = match get_process_status(self.source, pid) {
            Ok(r) => r,
            Err(e) if e.is_transient() => {
                debug!("PID {} had mappings but status is gone: {}", pid, e);
                return Ok(Verdict::NotApplicable);
            }
            Err(e) => return Err(e),
        };

        if !record.is_top_level() {
            trace!(
                "PID {}: thread context (pid={}, tgid={})",
                pid,
                record.pid,
                record.tgid
            );
            return Ok(Verdict::NotApplicable);
        }
        if record.pid != pid {
            debug!(
                "PID {}: status reports pid {} (namespace or reuse)",
                pid, record.pid
            );
        }

        if let Err(e) = self.source.stat_pid(pid) {
            debug!("PID {} ({}): lstat failed: {}", pid, record.name, e);
            return Ok(Verdict::Hidden);
        }

        let visible = match listing {
            Some(snapshot) => snapshot.contains(pid),
            None => PidListing::capture(self.source)?.contains(pid),
        };
        if visible {
            Ok(Verdict::NotHidden)
        } else {
            debug!(
                "PID {} ({}): missing from {} listing",
                pid,
                record.name,
                self.source.root_display()
            );
            Ok(Verdict::Hidden)
        }
    }
}

/// Evaluates one PID against `source` with the default re-verification delay.
pub fn check_pid_hidden<S: ProcSource + ?Sized>(
    source: &S,
    pid: Pid,
    verify_race: bool,
) -> Result<bool> {
    Detector::new(source).check_pid_hidden(pid, verify_race)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;

    /// Single-PID fake whose probes can be switched per call.
    #[derive(Default)]
    struct OnePid {
        pid: Pid,
        maps: Option<Vec<String>>,
        status: Option<Vec<String>>,
        stat_ok: Vec<bool>,
        listed: bool,
        stat_calls: Cell<usize>,
        list_calls: Cell<usize>,
        status_calls: Cell<usize>,
    }

    impl OnePid {
        fn process(pid: Pid, tgid: Pid) -> Self {
            Self {
                pid,
                maps: Some(vec!["00400000-00401000 r-xp 00000000 08:02 1 /bin/x".into()]),
                status: Some(vec![
                    "Name:\tx".into(),
                    format!("Tgid:\t{tgid}"),
                    format!("Pid:\t{pid}"),
                ]),
                stat_ok: vec![true],
                listed: true,
                ..Default::default()
            }
        }
    }

    fn not_found() -> io::Error {
        io::Error::from(io::ErrorKind::NotFound)
    }

    impl ProcSource for OnePid {
        fn read_status(&self, pid: Pid) -> io::Result<Vec<String>> {
            self.status_calls.set(self.status_calls.get() + 1);
            match (&self.status, pid == self.pid) {
                (Some(s), true) => Ok(s.clone()),
                _ => Err(not_found()),
            }
        }

        fn read_maps(&self, pid: Pid) -> io::Result<Vec<String>> {
            match (&self.maps, pid == self.pid) {
                (Some(m), true) => Ok(m.clone()),
                _ => Err(not_found()),
            }
        }

        fn stat_pid(&self, _pid: Pid) -> io::Result<()> {
            let n = self.stat_calls.get();
            self.stat_calls.set(n + 1);
            let ok = self
                .stat_ok
                .get(n)
                .or(self.stat_ok.last())
                .copied()
                .unwrap_or(false);
            if ok {
                Ok(())
            } else {
                Err(not_found())
            }
        }

        fn list_root(&self) -> io::Result<Vec<String>> {
            self.list_calls.set(self.list_calls.get() + 1);
            let mut names = vec!["self".to_string(), "1".to_string()];
            if self.listed {
                names.push(self.pid.to_string());
            }
            Ok(names)
        }

        fn root_display(&self) -> String {
            "/proc".into()
        }
    }

    fn detector(src: &OnePid) -> Detector<'_, OnePid> {
        Detector::new(src).with_verify_delay(Duration::ZERO)
    }

    #[test]
    fn test_visible_process_not_hidden() {
        let src = OnePid::process(500, 500);
        assert_eq!(detector(&src).check(500, true).unwrap(), Verdict::NotHidden);
    }

    #[test]
    fn test_stat_failure_short_circuits_listing() {
        let mut src = OnePid::process(777, 777);
        src.stat_ok = vec![false];
        assert_eq!(detector(&src).check(777, false).unwrap(), Verdict::Hidden);
        assert_eq!(src.list_calls.get(), 0);
    }

    #[test]
    fn test_missing_from_listing_is_hidden() {
        let mut src = OnePid::process(600, 600);
        src.listed = false;
        assert_eq!(detector(&src).check(600, false).unwrap(), Verdict::Hidden);
    }

    #[test]
    fn test_thread_context_never_flagged() {
        let mut src = OnePid::process(901, 900);
        src.stat_ok = vec![false];
        assert_eq!(
            detector(&src).check(901, true).unwrap(),
            Verdict::NotApplicable
        );
        assert_eq!(src.stat_calls.get(), 0);
    }

    #[test]
    fn test_empty_maps_skips_status_read() {
        let mut src = OnePid::process(42, 42);
        src.maps = Some(Vec::new());
        assert_eq!(
            detector(&src).check(42, true).unwrap(),
            Verdict::NotApplicable
        );
        assert_eq!(src.status_calls.get(), 0);
    }

    #[test]
    fn test_vanished_status_is_not_applicable() {
        let mut src = OnePid::process(43, 43);
        src.status = None;
        assert_eq!(
            detector(&src).check(43, true).unwrap(),
            Verdict::NotApplicable
        );
    }

    #[test]
    fn test_malformed_status_propagates() {
        let mut src = OnePid::process(44, 44);
        src.status = Some(vec!["Pid:\tfortyfour".into()]);
        let err = detector(&src).check(44, true).unwrap_err();
        assert!(matches!(err, DecloakError::MalformedRecord(_)));
    }

    #[test]
    fn test_race_retry_clears_exited_process() {
        let mut src = OnePid::process(55, 55);
        src.stat_ok = vec![false, true];
        assert_eq!(detector(&src).check(55, true).unwrap(), Verdict::NotHidden);
        assert_eq!(src.stat_calls.get(), 2);
    }

    #[test]
    fn test_race_retry_runs_exactly_once() {
        let mut src = OnePid::process(56, 56);
        src.stat_ok = vec![false];
        assert!(detector(&src).check_pid_hidden(56, true).unwrap());
        assert_eq!(src.stat_calls.get(), 2);
    }

    #[test]
    fn test_no_retry_without_verify_race() {
        let mut src = OnePid::process(57, 57);
        src.stat_ok = vec![false, true];
        assert!(detector(&src).check_pid_hidden(57, false).unwrap());
        assert_eq!(src.stat_calls.get(), 1);
    }

    #[test]
    fn test_snapshot_miss_is_rechecked_with_fresh_listing() {
        let src = OnePid::process(58, 58);
        let stale = PidListing::from_names(["1", "2"]);
        let verdict = detector(&src)
            .check_with_listing(58, true, Some(&stale))
            .unwrap();
        assert_eq!(verdict, Verdict::NotHidden);
        assert_eq!(src.list_calls.get(), 1);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let src = OnePid::process(1, 1);
        for pid in [0, -1, crate::process::MAX_PID + 1] {
            let err = detector(&src).check(pid, true).unwrap_err();
            assert!(matches!(err, DecloakError::InvalidArgument { .. }));
        }
        assert_eq!(src.status_calls.get(), 0);
        assert_eq!(src.stat_calls.get(), 0);
    }

    #[test]
    fn test_listing_parses_only_positive_integers() {
        let listing = PidListing::from_names(["self", "0", "-4", "17", "sys", "0042"]);
        assert_eq!(listing.len(), 2);
        assert!(listing.contains(17));
        assert!(listing.contains(42));
        assert!(!listing.contains(0));
    }
}
