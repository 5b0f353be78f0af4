//! Capture manager: continuous background capture plus on-demand shots.

use super::{CaptureError, CaptureStore, CaptureStrategy, CapturedImage};
use crate::config::CaptureConfig;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Owns the capture store and the background capture worker.
///
/// The store mutex covers append, evict, cleanup and latest-read, so the
/// worker and request handlers never observe a half-updated list.
pub struct CaptureManager {
    config: CaptureConfig,
    strategy: Arc<dyn CaptureStrategy>,
    store: Arc<Mutex<CaptureStore>>,
    running: AtomicBool,
    worker: std::sync::Mutex<Option<JoinHandle<()>>>,
    /// Next file sequence number; also serializes timestamping
    stamp: Arc<std::sync::Mutex<u64>>,
}

impl CaptureManager {
    pub fn new(config: CaptureConfig, strategy: Arc<dyn CaptureStrategy>) -> Self {
        let store = CaptureStore::new(config.max_retained);
        Self {
            config,
            strategy,
            store: Arc::new(Mutex::new(store)),
            running: AtomicBool::new(false),
            worker: std::sync::Mutex::new(None),
            stamp: Arc::new(std::sync::Mutex::new(0)),
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Whether the continuous loop is meant to be running
    pub fn is_capturing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the background loop. A no-op while already running.
    pub fn start_continuous_capture(self: &Arc<Self>) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Continuous capture already running");
            return;
        }

        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move { manager.capture_loop().await });

        let mut worker = self.worker.lock().unwrap_or_else(|p| p.into_inner());
        // A worker from an earlier start that outlived its stop grace period
        if let Some(stale) = worker.replace(handle) {
            stale.abort();
        }
        info!(
            "Started continuous capture (every {}s, keeping {})",
            self.config.interval_secs, self.config.max_retained
        );
    }

    /// Clear the running flag and wait up to `stop_grace` for the worker to
    /// exit; a worker still sleeping after that is aborted. Safe to call when
    /// never started.
    pub async fn stop_continuous_capture(&self) {
        self.running.store(false, Ordering::SeqCst);

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        let Some(mut handle) = handle else {
            return;
        };

        match tokio::time::timeout(self.config.stop_grace(), &mut handle).await {
            Ok(_) => info!("Stopped continuous capture"),
            Err(_) => {
                handle.abort();
                info!(
                    "Stopped continuous capture (worker aborted after {}ms)",
                    self.config.stop_grace_ms
                );
            }
        }
    }

    async fn capture_loop(self: Arc<Self>) {
        while self.running.load(Ordering::SeqCst) {
            match self.capture_once().await {
                Ok(image) => debug!("Scheduled capture: {}", image.path.display()),
                Err(e) => warn!("Scheduled capture failed: {}", e),
            }
            self.cleanup_expired().await;

            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(self.config.interval()).await;
        }
        debug!("Capture loop exited");
    }

    /// Take one screenshot now, independent of the continuous loop.
    pub async fn capture_once(&self) -> Result<CapturedImage, CaptureError> {
        // Either directory may have been removed externally since last time
        self.ensure_directories()?;

        let strategy = Arc::clone(&self.strategy);
        let store = Arc::clone(&self.store);
        let stamp = Arc::clone(&self.stamp);
        let screenshot_dir = self.config.screenshot_dir.clone();

        // Capture, write and append all run on the blocking thread. It
        // finishes even when the caller is dropped, so a written file is
        // always listed in the store.
        let (image, evicted) = tokio::task::spawn_blocking(move || {
            let frame = strategy.capture()?;
            let image = write_frame(&screenshot_dir, &stamp, &frame)?;
            let evicted = store.blocking_lock().push(image.clone());
            Ok::<_, CaptureError>((image, evicted))
        })
        .await
        .map_err(|e| CaptureError::Worker(e.to_string()))??;

        if evicted > 0 {
            debug!("Evicted {} old screenshot(s)", evicted);
        }
        info!("Screenshot saved: {}", image.path.display());
        Ok(image)
    }

    /// Most recent screenshot whose file still exists
    pub async fn latest(&self) -> Option<CapturedImage> {
        self.store.lock().await.latest().cloned()
    }

    pub async fn count(&self) -> usize {
        self.store.lock().await.len()
    }

    /// Snapshot of the retained screenshots, oldest first
    pub async fn images(&self) -> Vec<CapturedImage> {
        self.store.lock().await.iter().cloned().collect()
    }

    /// Remove screenshots older than `max_age_secs`. Returns how many went.
    pub async fn cleanup_expired(&self) -> usize {
        let removed = self
            .store
            .lock()
            .await
            .remove_older_than(self.config.max_age(), Utc::now());
        if removed > 0 {
            info!("Removed {} expired screenshot(s)", removed);
        }
        removed
    }

    fn ensure_directories(&self) -> Result<(), CaptureError> {
        fs::create_dir_all(&self.config.screenshot_dir)?;
        fs::create_dir_all(&self.config.cache_dir)?;
        Ok(())
    }
}

/// Stamp a frame and write it under `dir`.
///
/// Timestamp and sequence number are taken together under `stamp`, so
/// timestamps follow sequence order across threads.
fn write_frame(
    dir: &Path,
    stamp: &std::sync::Mutex<u64>,
    frame: &[u8],
) -> Result<CapturedImage, CaptureError> {
    let (captured_at, name) = {
        let mut seq = stamp.lock().unwrap_or_else(|p| p.into_inner());
        let captured_at = Utc::now();
        let name = file_name(captured_at, *seq);
        *seq += 1;
        (captured_at, name)
    };

    let path = dir.join(name);
    fs::write(&path, frame)?;
    Ok(CapturedImage { path, captured_at })
}

fn file_name(captured_at: DateTime<Utc>, seq: u64) -> String {
    format!(
        "screenshot_{}_{:04}.png",
        captured_at.format("%Y%m%d_%H%M%S_%6f"),
        seq % 10_000
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FakeCapture;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config_in(root: &Path, max_retained: usize) -> CaptureConfig {
        CaptureConfig {
            interval_secs: 1,
            max_retained,
            stop_grace_ms: 200,
            screenshot_dir: root.join("screenshots"),
            cache_dir: root.join("cache"),
            ..CaptureConfig::default()
        }
    }

    #[tokio::test]
    async fn test_capture_once_writes_file() {
        let root = TempDir::new().unwrap();
        let manager = CaptureManager::new(config_in(root.path(), 3), Arc::new(FakeCapture::new()));

        let image = manager.capture_once().await.unwrap();
        assert!(image.exists());
        assert!(image.path.starts_with(root.path().join("screenshots")));
        assert_eq!(manager.count().await, 1);
        assert_eq!(manager.latest().await, Some(image));
    }

    #[tokio::test]
    async fn test_capture_once_recreates_deleted_directories() {
        let root = TempDir::new().unwrap();
        let config = config_in(root.path(), 3);
        let manager = CaptureManager::new(config.clone(), Arc::new(FakeCapture::new()));

        manager.capture_once().await.unwrap();
        fs::remove_dir_all(&config.screenshot_dir).unwrap();
        fs::remove_dir_all(&config.cache_dir).unwrap();

        // Old entry's file is gone, so there is no usable latest image
        assert!(manager.latest().await.is_none());

        let image = manager.capture_once().await.unwrap();
        assert!(image.exists());
        assert!(config.cache_dir.is_dir());
        assert_eq!(manager.latest().await, Some(image));
    }

    #[tokio::test]
    async fn test_failed_capture_leaves_store_untouched() {
        let root = TempDir::new().unwrap();
        let fake = FakeCapture::new();
        let manager = CaptureManager::new(config_in(root.path(), 3), Arc::new(fake.clone()));

        manager.capture_once().await.unwrap();
        fake.set_failing(true);
        assert!(manager.capture_once().await.is_err());
        assert_eq!(manager.count().await, 1);
    }

    #[tokio::test]
    async fn test_file_names_are_unique() {
        let root = TempDir::new().unwrap();
        let manager = CaptureManager::new(config_in(root.path(), 5), Arc::new(FakeCapture::new()));

        let a = manager.capture_once().await.unwrap();
        let b = manager.capture_once().await.unwrap();
        assert_ne!(a.path, b.path);
        assert_eq!(manager.count().await, 2);
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_stop_is_safe() {
        let root = TempDir::new().unwrap();
        let fake = FakeCapture::new();
        let manager = Arc::new(CaptureManager::new(
            config_in(root.path(), 5),
            Arc::new(fake.clone()),
        ));

        // Stop before any start is a no-op
        manager.stop_continuous_capture().await;
        assert!(!manager.is_capturing());

        manager.start_continuous_capture();
        manager.start_continuous_capture();
        assert!(manager.is_capturing());

        tokio::time::sleep(Duration::from_millis(300)).await;
        manager.stop_continuous_capture().await;
        assert!(!manager.is_capturing());

        // One worker, one immediate capture, then sleeping on a 1s interval
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_expired_removes_nothing_fresh() {
        let root = TempDir::new().unwrap();
        let manager = CaptureManager::new(config_in(root.path(), 5), Arc::new(FakeCapture::new()));

        manager.capture_once().await.unwrap();
        assert_eq!(manager.cleanup_expired().await, 0);
        assert_eq!(manager.count().await, 1);
    }
}
