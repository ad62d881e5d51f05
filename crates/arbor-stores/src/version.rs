//! Staleness tokens for asynchronous results.
//!
//! A [`DataVersion`] is bumped whenever earlier in-flight work should stop
//! mattering. Work pins the version when it starts and checks the pin when
//! it finishes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A shared, monotonically increasing counter. Clones share the counter.
#[derive(Clone, Debug)]
pub struct DataVersion {
    counter: Arc<AtomicU64>,
}

impl Default for DataVersion {
    fn default() -> Self {
        Self::new()
    }
}

impl DataVersion {
    pub fn new() -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Invalidate every outstanding pin.
    pub fn next(&self) {
        self.counter.fetch_add(1, Ordering::AcqRel);
    }

    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    pub fn pin(&self) -> VersionPin {
        VersionPin {
            counter: Arc::clone(&self.counter),
            pinned: self.current(),
        }
    }
}

/// The version observed by one piece of work.
#[derive(Clone, Debug)]
pub struct VersionPin {
    counter: Arc<AtomicU64>,
    pinned: u64,
}

impl VersionPin {
    /// Returns `true` while the version has not moved since pinning. Once
    /// `false`, it stays `false`.
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::Acquire) == self.pinned
    }

    pub fn pinned(&self) -> u64 {
        self.pinned
    }
}

/// Runs a cleanup when in-flight work is dropped before it settles.
///
/// Async entry points arm one right after publishing their busy flag and
/// [`disarm`](Self::disarm) it once they settle normally.
pub(crate) struct OnCancel<F: FnOnce()> {
    cleanup: Option<F>,
}

impl<F: FnOnce()> OnCancel<F> {
    pub(crate) fn new(cleanup: F) -> Self {
        Self { cleanup: Some(cleanup) }
    }

    pub(crate) fn disarm(mut self) {
        self.cleanup = None;
    }
}

impl<F: FnOnce()> Drop for OnCancel<F> {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pin_goes_stale_after_next() {
        let version = DataVersion::new();
        let pin = version.pin();
        assert!(pin.is_current());
        version.next();
        assert!(!pin.is_current());
        assert!(version.pin().is_current());
    }

    #[test]
    fn clones_share_the_counter() {
        let version = DataVersion::new();
        let pin = version.pin();
        version.clone().next();
        assert!(!pin.is_current());
        assert_eq!(version.current(), 2);
    }

    #[test]
    fn cleanup_runs_only_when_armed() {
        let mut runs = 0;
        OnCancel::new(|| runs += 1).disarm();
        assert_eq!(runs, 0);
        drop(OnCancel::new(|| runs += 1));
        assert_eq!(runs, 1);
    }

    proptest! {
        #[test]
        fn pins_never_become_current_again(ops in proptest::collection::vec(any::<bool>(), 1..64)) {
            let version = DataVersion::new();
            let mut pins: Vec<(VersionPin, bool)> = Vec::new();
            for pin_now in ops {
                if pin_now {
                    pins.push((version.pin(), true));
                } else {
                    version.next();
                }
                for (pin, was_current) in pins.iter_mut() {
                    let now = pin.is_current();
                    prop_assert!(*was_current || !now);
                    *was_current = now;
                }
            }
        }
    }
}
