//! The "already running" guard shared by every training trigger.

use crate::errors::{Result, SensorError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Process-wide flag allowing at most one training run at a time.
///
/// Clones share the same flag.
#[derive(Clone, Default)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
    holder: Arc<RwLock<Option<Uuid>>>,
}

impl RunGuard {
    /// Creates an idle guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a run currently holds the guard.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The run holding the guard, if any.
    #[must_use]
    pub fn current_run(&self) -> Option<Uuid> {
        *self.holder.read()
    }

    /// Claims the guard for `run_id`.
    ///
    /// The guard is released when the returned permit is dropped.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::PipelineBusy` if another run holds it.
    pub fn try_acquire(&self, run_id: Uuid) -> Result<RunPermit> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(
                %run_id,
                holder = ?self.current_run(),
                "Training pipeline is already running"
            );
            return Err(SensorError::PipelineBusy);
        }
        *self.holder.write() = Some(run_id);
        Ok(RunPermit {
            guard: self.clone(),
            run_id,
        })
    }
}

impl std::fmt::Debug for RunGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunGuard")
            .field("running", &self.is_running())
            .field("holder", &self.current_run())
            .finish()
    }
}

/// Proof of holding the [`RunGuard`]; releases it on drop.
#[derive(Debug)]
pub struct RunPermit {
    guard: RunGuard,
    run_id: Uuid,
}

impl RunPermit {
    /// The run holding the guard.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        *self.guard.holder.write() = None;
        self.guard.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_default_idle() {
        let guard = RunGuard::new();
        assert!(!guard.is_running());
        assert!(guard.current_run().is_none());
    }

    #[test]
    fn test_second_acquire_is_busy() {
        let guard = RunGuard::new();
        let first = Uuid::new_v4();
        let permit = guard.try_acquire(first).unwrap();

        assert!(guard.is_running());
        assert_eq!(guard.current_run(), Some(first));
        assert!(matches!(
            guard.try_acquire(Uuid::new_v4()),
            Err(SensorError::PipelineBusy)
        ));
        assert_eq!(permit.run_id(), first);
    }

    #[test]
    fn test_drop_releases() {
        let guard = RunGuard::new();
        drop(guard.try_acquire(Uuid::new_v4()).unwrap());

        assert!(!guard.is_running());
        assert!(guard.try_acquire(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let guard = RunGuard::new();
        let clone = guard.clone();
        let _permit = guard.try_acquire(Uuid::new_v4()).unwrap();
        assert!(clone.is_running());
    }

    #[test]
    fn test_concurrent_acquire_admits_one() {
        let guard = RunGuard::new();
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    // Hold any permit until every thread has tried.
                    let permit = guard.try_acquire(Uuid::new_v4()).ok();
                    barrier.wait();
                    permit.is_some()
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
    }
}
