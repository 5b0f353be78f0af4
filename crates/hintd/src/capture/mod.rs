//! Screen capture: strategies, bounded store and the capture manager.
//!
//! Flow:
//! 1. A `CaptureStrategy` produces one PNG frame in memory
//! 2. `CaptureManager` writes it under the screenshot directory
//! 3. `CaptureStore` keeps the newest `max_retained` files, oldest first
//!
//! Invariants:
//! - Store length never exceeds `max_retained` once a mutation completes
//! - Eviction is FIFO and deletes the evicted file
//! - Native capture artifacts never outlive the capture call

pub mod manager;
pub mod store;
pub mod strategy;

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use manager::CaptureManager;
pub use store::CaptureStore;
pub use strategy::{
    platform_strategy, CaptureStrategy, FakeCapture, FallbackCapture, GenericCapture,
    NativeCapture,
};

/// A screenshot written to disk and owned by the `CaptureStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub path: PathBuf,
    pub captured_at: DateTime<Utc>,
}

impl CapturedImage {
    /// Whether the backing file is still present
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Capture failures. None of these are fatal to the daemon.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Native capture failed: {0}")]
    NativeFailed(String),

    /// The OS refused screen access. `hint` tells the user what to grant.
    #[error("Screen capture permission denied. {hint}")]
    PermissionDenied { hint: String },

    #[error("Capture timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Generic capture failed: {0}")]
    GenericFailed(String),

    #[error("Capture unsupported: {0}")]
    Unsupported(String),

    #[error("Capture worker failed: {0}")]
    Worker(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("{primary}; fallback also failed: {fallback}")]
    Exhausted {
        primary: Box<CaptureError>,
        fallback: Box<CaptureError>,
    },
}

impl CaptureError {
    /// Actionable permission hint, looking through fallback chains.
    pub fn permission_hint(&self) -> Option<&str> {
        match self {
            CaptureError::PermissionDenied { hint } => Some(hint),
            CaptureError::Exhausted { primary, fallback } => primary
                .permission_hint()
                .or_else(|| fallback.permission_hint()),
            _ => None,
        }
    }
}
