//! Error taxonomy for a download session.
//!
//! The first error raised by any component aborts the whole session and is
//! returned to the caller unchanged. Nothing here is retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Response carried an error-class status (>= 300).
    #[error("response status fail: HTTP {0}")]
    RequestFailed(u32),

    /// Content-Range header present but not `bytes A-B/TOTAL` or `bytes */TOTAL`.
    #[error("invalid content-range header in response: {0}")]
    InvalidRangeHeader(String),

    /// Network-level failure reported by curl (DNS, connect, TLS, timeout, reset).
    #[error("transport: {0}")]
    Transport(#[from] curl::Error),

    /// Server answered a range request with a body length that does not match the range.
    #[error(
        "range request returned invalid Content-Length: {} however the range was: {range} ({expected} bytes)",
        received.map(|n| n.to_string()).unwrap_or_else(|| "none".to_string())
    )]
    RangeLengthMismatch {
        range: String,
        expected: u64,
        received: Option<u64>,
    },

    /// Local write into the destination file failed.
    #[error("write: {0}")]
    Write(#[source] std::io::Error),

    /// Response body ended before the announced length was copied.
    #[error("read: body ended after {received} of {expected} bytes")]
    Read { expected: u64, received: u64 },

    /// The session's cancel token fired first.
    #[error("download canceled")]
    Canceled,

    /// Operation called in a state that does not allow it (e.g. start before init).
    #[error("invalid session state: {0}")]
    InvalidState(&'static str),

    /// A worker thread panicked or its result channel closed unexpectedly.
    #[error("chunk worker panicked")]
    WorkerPanicked,
}

impl DownloadError {
    /// True for errors that came from the cancel token rather than the transfer itself.
    pub fn is_canceled(&self) -> bool {
        matches!(self, DownloadError::Canceled)
    }
}
