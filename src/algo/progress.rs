//! Progress reporting and cooperative cancellation for long-running algorithms.
//!
//! # Example
//!
//! ```
//! use trimesh_topo::algo::progress::{Progress, StopToken};
//!
//! let progress = Progress::new(|current, total, message| {
//!     log::info!("[{}/{}] {}", current, total, message);
//! });
//! progress.report(1, 4, "collapsing edges");
//!
//! let stop = StopToken::new();
//! let handle = stop.clone();
//! handle.stop();
//! assert!(stop.is_stopped());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A progress callback that receives updates during long-running operations.
///
/// The callback receives:
/// - `current`: Current step (0-based)
/// - `total`: Total number of steps
/// - `message`: Description of the current operation
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current.min(total), total, message);
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

/// Shared flag asking an algorithm to stop at its next checkpoint.
///
/// Clones share the same flag, so one clone can be handed to another thread
/// while the algorithm polls the other. Algorithms only look at the flag
/// between atomic steps; the mesh is always left consistent.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// Create a token that has not been triggered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the algorithm to stop.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether [`stop`](Self::stop) has been called on any clone.
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clear the flag so the token can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}
