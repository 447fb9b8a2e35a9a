//! Connection-count accounting, mirroring the proxy's `ConnectionGuard`:
//! a `Drop`-based counter so a dropped or panicking task never leaks a slot.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared counter of currently-connected WTPs, checked against
/// `SecurityConfig::max_wtps` before a new socket is accepted.
#[derive(Debug, Clone, Default)]
pub struct WtpCounter(Arc<AtomicUsize>);

impl WtpCounter {
    pub fn new() -> Self {
        Self(Arc::new(AtomicUsize::new(0)))
    }

    pub fn current(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Reserve a slot if under `max`. Returns `None` (and reserves nothing)
    /// when the pool is already full.
    pub fn try_acquire(&self, max: usize) -> Option<WtpGuard> {
        loop {
            let current = self.0.load(Ordering::Relaxed);
            if current >= max {
                return None;
            }
            if self
                .0
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return Some(WtpGuard { counter: self.0.clone() });
            }
        }
    }
}

/// Releases its reserved slot on drop, whichever way the connection task
/// exits (normal close, socket error, or panic).
#[derive(Debug)]
pub struct WtpGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for WtpGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}
