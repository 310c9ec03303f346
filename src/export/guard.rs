//! RAII guard for the "generation in progress" flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Holds the in-progress flag; clears it when dropped.
pub(super) struct InProgressGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InProgressGuard<'a> {
    /// Set the flag, or return `None` if a run already holds it.
    pub(super) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let flag = AtomicBool::new(false);
        let guard = InProgressGuard::acquire(&flag).unwrap();
        assert!(flag.load(Ordering::Acquire));
        assert!(InProgressGuard::acquire(&flag).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(InProgressGuard::acquire(&flag).is_some());
    }
}
