use std::num::ParseIntError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GopherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection timed out")]
    Timeout,
    #[error("Host {host} did not resolve to any address")]
    Resolve { host: String },
    #[error("Request cannot be encoded as {encoding}")]
    Encode { encoding: &'static str },
    #[error("Invalid port {value:?}: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("Expected {expected:?} (got {got:?})")]
    TypeMismatch { got: String, expected: String },
    #[error("Response exceeded {limit} bytes")]
    ResponseTooLarge { limit: u64 },
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
}

impl GopherError {
    /// Folds socket timeouts into [`GopherError::Timeout`].
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => GopherError::Timeout,
            _ => GopherError::Io(err),
        }
    }
}
