//! Brute-force sweep of the PID space.
//!
//! Every PID in `[MIN_PID, max_pid)` is handed to the [`Detector`], whether or
//! not it shows up in `/proc`; that is the point. Per-PID errors never stop the
//! sweep.

use crate::process::detector::{Detector, PidListing, Verdict, HIDDEN_VERIFY_DELAY};
use crate::process::source::ProcSource;
use crate::process::{Pid, MAX_PID, MIN_PID};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tunables for one scan pass.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Exclusive upper bound of the sweep; clamped to `MAX_PID`.
    pub max_pid: Pid,
    pub verify_race: bool,
    pub verify_delay: Duration,
    /// Worker threads. `1` scans sequentially, `0` uses one worker per CPU.
    pub parallelism: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_pid: MAX_PID,
            verify_race: true,
            verify_delay: HIDDEN_VERIFY_DELAY,
            parallelism: 1,
        }
    }
}

/// Result of one scan pass.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Hidden PIDs in ascending order.
    pub hidden: Vec<Pid>,
    /// Number of PIDs evaluated.
    pub scanned: usize,
    /// PIDs whose evaluation returned an error (discarded).
    pub errors: usize,
    pub elapsed: Duration,
}

pub struct Scanner<'a, S: ?Sized> {
    source: &'a S,
    options: ScanOptions,
}

impl<'a, S: ProcSource + Sync + ?Sized> Scanner<'a, S> {
    pub fn new(source: &'a S, options: ScanOptions) -> Self {
        Self { source, options }
    }

    fn upper_bound(&self) -> Pid {
        self.options.max_pid.clamp(MIN_PID, MAX_PID)
    }

    fn detector(&self) -> Detector<'a, S> {
        Detector::new(self.source).with_verify_delay(self.options.verify_delay)
    }

    /// Runs the sweep with the configured parallelism.
    pub fn scan(&self) -> ScanReport {
        let start = Instant::now();
        let upper = self.upper_bound();
        info!(
            "Scanning PIDs {}..{} (parallelism: {})",
            MIN_PID, upper, self.options.parallelism
        );

        let errors = AtomicUsize::new(0);
        let hidden = if self.options.parallelism == 1 {
            self.scan_sequential(upper, &errors)
        } else {
            self.scan_parallel(upper, &errors)
        };

        let report = ScanReport {
            hidden,
            scanned: (upper - MIN_PID) as usize,
            errors: errors.load(Ordering::Relaxed),
            elapsed: start.elapsed(),
        };
        info!(
            "Scan finished in {:.2}s: {} hidden, {} errors",
            report.elapsed.as_secs_f64(),
            report.hidden.len(),
            report.errors
        );
        report
    }

    /// One PID at a time, reading a fresh listing for every visible process.
    fn scan_sequential(&self, upper: Pid, errors: &AtomicUsize) -> Vec<Pid> {
        let detector = self.detector();
        (MIN_PID..upper)
            .filter(|&pid| self.evaluate(&detector, pid, None, errors))
            .collect()
    }

    /// Bounded worker pool sharing one listing snapshot for the first pass.
    fn scan_parallel(&self, upper: Pid, errors: &AtomicUsize) -> Vec<Pid> {
        // Without a snapshot every suspect reads the listing itself
        let listing = match PidListing::capture(self.source) {
            Ok(listing) => {
                debug!("Captured listing snapshot with {} PIDs", listing.len());
                Some(listing)
            }
            Err(e) => {
                warn!("Listing snapshot unavailable, reading it per PID: {}", e);
                None
            }
        };

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.parallelism)
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("Failed to build scan thread pool, using the global one: {}", e);
                None
            }
        };

        let run = || {
            let detector = self.detector();
            (MIN_PID..upper)
                .into_par_iter()
                .filter(|&pid| self.evaluate(&detector, pid, listing.as_ref(), errors))
                .collect::<Vec<Pid>>()
        };

        // Order is preserved by the collect
        match pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    fn evaluate(
        &self,
        detector: &Detector<'a, S>,
        pid: Pid,
        listing: Option<&PidListing>,
        errors: &AtomicUsize,
    ) -> bool {
        match detector.check_with_listing(pid, self.options.verify_race, listing) {
            Ok(Verdict::Hidden) => {
                warn!("PID {} is hidden", pid);
                true
            }
            Ok(_) => false,
            Err(e) => {
                debug!("PID {}: {}", pid, e);
                errors.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }
}

/// Sweeps `[MIN_PID, MAX_PID)` sequentially with race verification and
/// returns the hidden PIDs in ascending order.
pub fn scan_for_hidden_pids<S: ProcSource + Sync + ?Sized>(source: &S) -> Vec<Pid> {
    let scanner = Scanner::new(source, ScanOptions::default());
    scanner.scan().hidden
}
