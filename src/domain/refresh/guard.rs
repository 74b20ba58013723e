use std::sync::atomic::{AtomicBool, Ordering};

/// Single-writer flag that keeps refresh passes from overlapping.
///
/// Not a queue: a pass that cannot acquire it is skipped, not deferred.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    running: AtomicBool,
}

impl RefreshGuard {
    pub fn try_acquire(&self) -> Option<RefreshPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshPermit { guard: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Releases the guard when dropped, on every exit path including
/// cancellation of the owning future.
#[derive(Debug)]
pub struct RefreshPermit<'a> {
    guard: &'a RefreshGuard,
}

impl Drop for RefreshPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}
