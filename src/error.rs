use std::io;
use thiserror::Error;

/// Result type used throughout the sieve.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported before any sieving starts.
#[derive(Debug, Error)]
pub enum Error {
    /// A bound is outside of what the sieve supports
    /// (stop above `max_stop()`, start > stop, n = 0, ...).
    #[error("out of range: {message}")]
    OutOfRange {
        /// Description of the offending bound.
        message: String,
    },

    /// A configuration value is outside its documented bounds.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of the offending setting.
        message: String,
    },

    /// Writing primes to an output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}
