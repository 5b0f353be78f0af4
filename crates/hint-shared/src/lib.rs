//! Shared types for the hint daemon and its CLI client.

pub mod error;
pub mod schemas;

pub use error::HintError;
pub use schemas::*;

/// Crate version, shared by daemon and client so they report the same string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default address the daemon binds to and the client talks to.
pub const DEFAULT_DAEMON_URL: &str = "http://127.0.0.1:8080";
