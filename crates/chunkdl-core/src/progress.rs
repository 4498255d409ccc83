//! Progress reporting for a running download (bytes done, rate, ETA).
//!
//! A `ProgressHandle` is cloned out of the session before `start()` and read
//! from any thread while the workers run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Snapshot of download progress.
#[derive(Debug, Clone)]
pub struct ProgressStats {
    /// Bytes received so far across the probe and all chunks.
    pub bytes_done: u64,
    /// Expected total; 0 while unknown.
    pub total_bytes: u64,
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Average rate since start in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if the total is unknown or nothing arrived yet).
    pub fn eta_secs(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        let remaining = self.total_bytes.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0]; 0 while the total is unknown.
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64).min(1.0)
    }
}

/// Thread-safe view of a session's byte counter and expected size.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    pub(crate) bytes: Arc<AtomicU64>,
    pub(crate) total: Arc<AtomicU64>,
    started_at: Arc<Mutex<Instant>>,
}

impl ProgressHandle {
    pub(crate) fn new() -> Self {
        Self {
            bytes: Arc::new(AtomicU64::new(0)),
            total: Arc::new(AtomicU64::new(0)),
            started_at: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Restarts the rate clock; every clone of the handle sees the new start.
    pub(crate) fn restart(&self) {
        *self
            .started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn elapsed_secs(&self) -> f64 {
        self.started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
            .as_secs_f64()
    }

    pub fn bytes_done(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn total_bytes(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> ProgressStats {
        ProgressStats {
            bytes_done: self.bytes_done(),
            total_bytes: self.total_bytes(),
            elapsed_secs: self.elapsed_secs(),
        }
    }
}
