//! Error types for talking to the hint daemon.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HintError {
    #[error("Daemon not reachable at {0}. Is hintd running?")]
    DaemonUnreachable(String),

    #[error("HTTP error: {0}")]
    Http(String),

    /// The daemon answered with a non-success status and an `{error}` body.
    #[error("Daemon returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HintError {
    /// Process exit code used by the CLI for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            HintError::DaemonUnreachable(_) => 2,
            HintError::Http(_) => 3,
            HintError::Api { status, .. } if *status < 500 => 4,
            HintError::Api { .. } => 5,
            HintError::Json(_) => 6,
            HintError::Io(_) => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_exit_codes_split_client_and_server() {
        let client = HintError::Api {
            status: 400,
            message: "Empty query".to_string(),
        };
        let server = HintError::Api {
            status: 500,
            message: "Failed to capture screenshot".to_string(),
        };
        assert_eq!(client.exit_code(), 4);
        assert_eq!(server.exit_code(), 5);
    }

    #[test]
    fn test_unreachable_message_names_url() {
        let err = HintError::DaemonUnreachable("http://127.0.0.1:8080".to_string());
        assert!(err.to_string().contains("127.0.0.1:8080"));
    }
}
