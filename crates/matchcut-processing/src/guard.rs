//! Per-file in-flight tracking
//!
//! At most one analyzer run per staged file name may be in flight at a time.
//! Sequential re-runs of the same name are allowed and overwrite the previous
//! output.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Tracks staged file names with a run currently in flight.
#[derive(Clone, Default)]
pub struct InFlightGuard {
    held: Arc<Mutex<HashSet<String>>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a file name, or `None` if a run for it is already in flight.
    ///
    /// The returned slot releases the name when dropped, so the name is freed
    /// on success, failure, and panic alike.
    pub fn try_acquire(&self, file_name: &str) -> Option<InFlightSlot> {
        let mut held = lock_held(&self.held);
        if held.insert(file_name.to_string()) {
            Some(InFlightSlot {
                file_name: file_name.to_string(),
                held: Arc::clone(&self.held),
            })
        } else {
            None
        }
    }

    pub fn is_held(&self, file_name: &str) -> bool {
        lock_held(&self.held).contains(file_name)
    }
}

/// RAII claim on one file name.
pub struct InFlightSlot {
    file_name: String,
    held: Arc<Mutex<HashSet<String>>>,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        lock_held(&self.held).remove(&self.file_name);
    }
}

// A poisoned lock only means some thread panicked between insert and remove;
// the set itself is still consistent, so recover it rather than propagating.
fn lock_held(held: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_then_duplicate_is_rejected() {
        let guard = InFlightGuard::new();

        let slot = guard.try_acquire("video_1_clip.mp4");
        assert!(slot.is_some());
        assert!(guard.try_acquire("video_1_clip.mp4").is_none());
    }

    #[test]
    fn test_different_names_do_not_contend() {
        let guard = InFlightGuard::new();

        let _a = guard.try_acquire("video_1_a.mp4").unwrap();
        assert!(guard.try_acquire("video_2_b.mp4").is_some());
    }

    #[test]
    fn test_drop_releases_the_name() {
        let guard = InFlightGuard::new();

        {
            let _slot = guard.try_acquire("video_1_clip.mp4").unwrap();
            assert!(guard.is_held("video_1_clip.mp4"));
        }

        assert!(!guard.is_held("video_1_clip.mp4"));
        assert!(guard.try_acquire("video_1_clip.mp4").is_some());
    }
}
