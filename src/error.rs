use thiserror::Error;

/// Errors raised by the strip driver
#[derive(Debug, Error)]
pub enum Error {
    /// A channel, packed color or brightness value is outside its domain
    #[error("{0}")]
    Range(String),

    /// A pixel index at or past the end of the strip
    #[error("pixel index {index} is outside the range 0..{count}")]
    Index { index: usize, count: usize },

    /// No transport could be opened, or it failed mid-transaction
    #[error("transport unavailable during {operation}: {message}")]
    TransportUnavailable {
        operation: &'static str,
        message: String,
    },
}

impl Error {
    pub(crate) fn transport(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Error::TransportUnavailable {
            operation,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
