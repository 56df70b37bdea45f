// src/progress.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Advisory cancellation flag, polled once per read-loop iteration.
/// Cancellation never interrupts a half-processed read.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Sink for coarse progress reporting. Implementations must tolerate being
/// called from the single streaming worker only; no re-entrancy is required.
pub trait ProgressListener: Send + Sync {
    fn set_subtask(&self, _subtask: &str) {}
    fn set_maximum(&self, _maximum: u64) {}
    fn set_progress(&self, _progress: u64) {}
}

/// Listener that drops everything; used by embedders and tests.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressListener for NoProgress {}

/// Listener that forwards subtask changes to the log and stays quiet about
/// per-read positions.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressListener for LogProgress {
    fn set_subtask(&self, subtask: &str) {
        log::info!("{}", subtask);
    }
}
