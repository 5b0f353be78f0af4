//! Capture strategies.
//!
//! Production code picks one strategy at startup with `platform_strategy`:
//! on macOS the native `screencapture` tool with a generic fallback, elsewhere
//! the generic capture alone. Tests use `FakeCapture`.
//!
//! Captures are always full-screen, with no region cropping.

use super::CaptureError;
use crate::config::CaptureConfig;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Diagnostic fragments the macOS tool prints when screen access is refused
const PERMISSION_MARKERS: &[&str] = &[
    "not permitted",
    "not authorized",
    "permission",
    "screen recording",
    "could not create image from display",
];

const PERMISSION_HINT: &str = "Grant Screen Recording access to the app running hintd in \
System Settings > Privacy & Security > Screen & System Audio Recording, then restart it.";

/// A procedure producing one full-screen PNG frame
pub trait CaptureStrategy: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &'static str;

    /// Capture the screen. Blocking; callers run it off the async executor.
    fn capture(&self) -> Result<Vec<u8>, CaptureError>;
}

// ============================================================================
// Native capture (macOS screencapture)
// ============================================================================

/// Shells out to a native capture tool that writes a PNG to a path argument.
///
/// The tool writes into a temp file under the cache directory; the file is
/// removed when the call returns, on success and failure alike.
pub struct NativeCapture {
    program: String,
    args: Vec<String>,
    cache_dir: PathBuf,
    timeout: Duration,
}

impl NativeCapture {
    /// `screencapture -x <file>`: silent, full screen
    pub fn screencapture(cache_dir: PathBuf, timeout: Duration) -> Self {
        Self::with_command("screencapture", vec!["-x".to_string()], cache_dir, timeout)
    }

    /// Any tool taking the output path as its last argument
    pub fn with_command(
        program: impl Into<String>,
        args: Vec<String>,
        cache_dir: PathBuf,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            cache_dir,
            timeout,
        }
    }

    fn run_tool(&self, output: &std::path::Path) -> Result<Vec<u8>, CaptureError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CaptureError::NativeFailed(format!("failed to launch {}: {}", self.program, e))
            })?;

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CaptureError::Timeout(self.timeout));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CaptureError::NativeFailed(format!(
                    "waiting for {} failed: {}",
                    self.program, e
                )));
            }
        };

        let mut diagnostics = String::new();
        if let Some(mut stderr) = child.stderr.take() {
            let _ = stderr.read_to_string(&mut diagnostics);
        }

        if is_permission_denial(&diagnostics) {
            return Err(CaptureError::PermissionDenied {
                hint: PERMISSION_HINT.to_string(),
            });
        }

        if !status.success() {
            return Err(CaptureError::NativeFailed(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                diagnostics.trim()
            )));
        }

        let bytes = fs::read(output)?;
        if bytes.is_empty() {
            return Err(CaptureError::NativeFailed(format!(
                "{} produced an empty image",
                self.program
            )));
        }
        Ok(bytes)
    }
}

impl CaptureStrategy for NativeCapture {
    fn name(&self) -> &'static str {
        "native"
    }

    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        fs::create_dir_all(&self.cache_dir)?;
        // Dropping the handle deletes the file, whichever way we leave
        let artifact = tempfile::Builder::new()
            .prefix("native_")
            .suffix(".png")
            .tempfile_in(&self.cache_dir)?;

        debug!("Running {} into {}", self.program, artifact.path().display());
        self.run_tool(artifact.path())
    }
}

fn is_permission_denial(diagnostics: &str) -> bool {
    let lower = diagnostics.to_lowercase();
    PERMISSION_MARKERS.iter().any(|marker| lower.contains(marker))
}

// ============================================================================
// Generic capture (xcap)
// ============================================================================

/// Cross-platform capture of the primary monitor.
///
/// Backed by `xcap` through the default `xcap-capture` feature. Builds with
/// default features off report `Unsupported` on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericCapture;

impl CaptureStrategy for GenericCapture {
    fn name(&self) -> &'static str {
        "generic"
    }

    #[cfg(feature = "xcap-capture")]
    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        use std::io::Cursor;
        use xcap::image::{DynamicImage, ImageFormat};

        let monitor = xcap::Monitor::all()
            .map_err(|e| CaptureError::GenericFailed(format!("failed to enumerate monitors: {e}")))?
            .into_iter()
            .next()
            .ok_or_else(|| CaptureError::GenericFailed("no monitors found".to_string()))?;

        let frame = monitor
            .capture_image()
            .map_err(|e| CaptureError::GenericFailed(format!("monitor capture failed: {e}")))?;
        if frame.width() == 0 || frame.height() == 0 {
            return Err(CaptureError::GenericFailed(
                "captured an empty frame (no display or no permission)".to_string(),
            ));
        }

        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(frame)
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| CaptureError::GenericFailed(format!("PNG encoding failed: {e}")))?;
        Ok(png.into_inner())
    }

    #[cfg(not(feature = "xcap-capture"))]
    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        Err(CaptureError::Unsupported(
            "hintd was built without the xcap-capture feature".to_string(),
        ))
    }
}

// ============================================================================
// Fallback decorator
// ============================================================================

/// Tries `primary`, then `fallback` on any primary failure.
pub struct FallbackCapture {
    primary: Box<dyn CaptureStrategy>,
    fallback: Box<dyn CaptureStrategy>,
}

impl FallbackCapture {
    pub fn new(primary: Box<dyn CaptureStrategy>, fallback: Box<dyn CaptureStrategy>) -> Self {
        Self { primary, fallback }
    }
}

impl CaptureStrategy for FallbackCapture {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        let primary_err = match self.primary.capture() {
            Ok(bytes) => return Ok(bytes),
            Err(e) => e,
        };

        if let Some(hint) = primary_err.permission_hint() {
            warn!("{} capture lacks permission: {}", self.primary.name(), hint);
        } else {
            warn!(
                "{} capture failed, falling back to {}: {}",
                self.primary.name(),
                self.fallback.name(),
                primary_err
            );
        }

        self.fallback
            .capture()
            .map_err(|fallback_err| CaptureError::Exhausted {
                primary: Box::new(primary_err),
                fallback: Box::new(fallback_err),
            })
    }
}

/// Strategy for the running platform, chosen once at startup
pub fn platform_strategy(config: &CaptureConfig) -> Arc<dyn CaptureStrategy> {
    if cfg!(target_os = "macos") {
        Arc::new(FallbackCapture::new(
            Box::new(NativeCapture::screencapture(
                config.cache_dir.clone(),
                config.native_timeout(),
            )),
            Box::new(GenericCapture),
        ))
    } else {
        Arc::new(GenericCapture)
    }
}

// ============================================================================
// Fake capture (testing)
// ============================================================================

/// In-memory strategy for deterministic tests.
///
/// Returns a fixed frame, counts calls, and can be switched to failing.
#[derive(Clone)]
pub struct FakeCapture {
    frame: Vec<u8>,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl FakeCapture {
    pub fn new() -> Self {
        Self::with_frame(b"\x89PNG\r\n\x1a\nfake-frame".to_vec())
    }

    pub fn with_frame(frame: Vec<u8>) -> Self {
        Self {
            frame,
            failing: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A strategy that always fails
    pub fn failing() -> Self {
        let fake = Self::new();
        fake.set_failing(true);
        fake
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FakeCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureStrategy for FakeCapture {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CaptureError::NativeFailed("fake capture failure".to_string()));
        }
        Ok(self.frame.clone())
    }
}
