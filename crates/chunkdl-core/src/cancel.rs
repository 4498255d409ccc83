//! Cooperative cancellation scope shared by the probe, the orchestrator and every worker.
//!
//! A token is a set of abort flags. `child()` adds a flag of its own, so canceling
//! a child stops only the work bound to it, while canceling the parent reaches
//! every child. Transfers observe the token from curl's progress callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CancelToken {
    flags: Vec<Arc<AtomicBool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            flags: vec![Arc::new(AtomicBool::new(false))],
        }
    }

    /// Token canceled when either this token or the returned one is canceled.
    pub fn child(&self) -> Self {
        let mut flags = self.flags.clone();
        flags.push(Arc::new(AtomicBool::new(false)));
        Self { flags }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        if let Some(own) = self.flags.last() {
            own.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.flags.iter().any(|f| f.load(Ordering::Relaxed))
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
