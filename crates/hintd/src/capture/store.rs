//! Bounded, oldest-first retention list of captured screenshots.

use super::CapturedImage;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::io::ErrorKind;
use std::time::Duration;
use tracing::{debug, warn};

/// Screenshots kept on disk, in capture order.
///
/// The store owns the files it lists: evicted and expired entries have their
/// file deleted. Callers serialize access (the manager holds it in a mutex).
#[derive(Debug)]
pub struct CaptureStore {
    entries: VecDeque<CapturedImage>,
    max_retained: usize,
}

impl CaptureStore {
    /// With a bound of zero every pushed image is evicted right away.
    pub fn new(max_retained: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_retained + 1),
            max_retained,
        }
    }

    pub fn max_retained(&self) -> usize {
        self.max_retained
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl Iterator<Item = &CapturedImage> {
        self.entries.iter()
    }

    /// Insert a capture in timestamp order, then evict from the front while
    /// over the bound. Returns how many entries were evicted.
    ///
    /// Captures finishing out of order still land in capture order, so the
    /// front is always the oldest.
    pub fn push(&mut self, image: CapturedImage) -> usize {
        let at = self.entries.partition_point(|e| e.captured_at <= image.captured_at);
        self.entries.insert(at, image);
        let mut evicted = 0;
        while self.entries.len() > self.max_retained {
            if let Some(old) = self.entries.pop_front() {
                debug!("Evicting screenshot {}", old.path.display());
                release(&old);
                evicted += 1;
            }
        }
        evicted
    }

    /// Most recent entry, if its file still exists
    pub fn latest(&self) -> Option<&CapturedImage> {
        self.entries.back().filter(|image| image.exists())
    }

    /// Drop entries captured more than `max_age` before `now`.
    /// Returns how many entries were removed.
    pub fn remove_older_than(&mut self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let Ok(max_age) = chrono::Duration::from_std(max_age) else {
            return 0;
        };
        let cutoff = now - max_age;

        let before = self.entries.len();
        self.entries.retain(|image| {
            if image.captured_at < cutoff {
                release(image);
                false
            } else {
                true
            }
        });
        before - self.entries.len()
    }
}

/// Best-effort removal of a screenshot file
fn release(image: &CapturedImage) {
    if let Err(e) = std::fs::remove_file(&image.path) {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to delete {}: {}", image.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn image_in(dir: &Path, name: &str, captured_at: DateTime<Utc>) -> CapturedImage {
        let path = dir.join(name);
        std::fs::write(&path, b"png").unwrap();
        CapturedImage { path, captured_at }
    }

    #[test]
    fn test_push_evicts_oldest_and_deletes_file() {
        let dir = TempDir::new().unwrap();
        let mut store = CaptureStore::new(2);
        let now = Utc::now();

        let first = image_in(dir.path(), "a.png", now);
        let second = image_in(dir.path(), "b.png", now);
        let third = image_in(dir.path(), "c.png", now);

        assert_eq!(store.push(first.clone()), 0);
        assert_eq!(store.push(second.clone()), 0);
        assert_eq!(store.push(third.clone()), 1);

        assert_eq!(store.len(), 2);
        assert!(!first.path.exists());
        let kept: Vec<_> = store.iter().cloned().collect();
        assert_eq!(kept, vec![second, third]);
    }

    #[test]
    fn test_latest_skips_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut store = CaptureStore::new(3);
        assert!(store.latest().is_none());

        let image = image_in(dir.path(), "a.png", Utc::now());
        store.push(image.clone());
        assert_eq!(store.latest(), Some(&image));

        std::fs::remove_file(&image.path).unwrap();
        assert!(store.latest().is_none());
    }

    #[test]
    fn test_remove_older_than_keeps_recent() {
        let dir = TempDir::new().unwrap();
        let mut store = CaptureStore::new(10);
        let now = Utc::now();

        let stale = image_in(dir.path(), "old.png", now - chrono::Duration::hours(2));
        let fresh = image_in(dir.path(), "new.png", now - chrono::Duration::minutes(5));
        store.push(stale.clone());
        store.push(fresh.clone());

        let removed = store.remove_older_than(Duration::from_secs(3600), now);
        assert_eq!(removed, 1);
        assert!(!stale.path.exists());
        assert_eq!(store.iter().collect::<Vec<_>>(), vec![&fresh]);
    }

    #[test]
    fn test_late_push_lands_in_capture_order() {
        let dir = TempDir::new().unwrap();
        let mut store = CaptureStore::new(2);
        let now = Utc::now();

        let oldest = image_in(dir.path(), "a.png", now - chrono::Duration::seconds(2));
        let middle = image_in(dir.path(), "b.png", now - chrono::Duration::seconds(1));
        let newest = image_in(dir.path(), "c.png", now);

        store.push(newest.clone());
        store.push(middle.clone());
        assert_eq!(store.iter().collect::<Vec<_>>(), vec![&middle, &newest]);

        // Older than everything retained: evicted on arrival
        assert_eq!(store.push(oldest.clone()), 1);
        assert!(!oldest.path.exists());
        assert_eq!(store.iter().collect::<Vec<_>>(), vec![&middle, &newest]);
        assert_eq!(store.latest(), Some(&newest));
    }

    #[test]
    fn test_zero_bound_keeps_nothing() {
        let dir = TempDir::new().unwrap();
        let mut store = CaptureStore::new(0);
        assert_eq!(store.max_retained(), 0);

        let image = image_in(dir.path(), "a.png", Utc::now());
        assert_eq!(store.push(image.clone()), 1);
        assert!(store.is_empty());
        assert!(store.latest().is_none());
        assert!(!image.path.exists());
    }
}
