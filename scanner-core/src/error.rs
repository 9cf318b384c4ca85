//! Error types for scan-session operations.

use thiserror::Error;

/// Result type for scan-session operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while driving a scan session.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The camera could not be opened (missing device, permission denied).
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    /// The decoder engine failed to initialize for another reason.
    #[error("decoder initialization failed: {0}")]
    Initialization(String),

    /// The decoder engine reported a failure while shutting down.
    #[error("decoder teardown failed: {0}")]
    Teardown(String),

    /// The session event loop is no longer running.
    #[error("scan session is closed")]
    SessionClosed,
}
