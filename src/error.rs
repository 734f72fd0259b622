//! Crate-wide error type.

use core::fmt;

/// Errors produced by the extraction pipeline.
#[derive(Debug)]
pub enum Error {
    /// Bad input: unreadable path, malformed page range, out-of-range index.
    Input(String),
    /// The underlying PDF extractor reported a failure (open, flatten,
    /// annotation read, ...).
    Extractor(String),
    /// A bounding-box rotation was requested for a value that is not a
    /// multiple of 90 degrees.
    InvalidRotation(f64),
    /// A page-shard worker failed; the whole extraction call aborts.
    WorkerFailed(String),
    /// A text-postprocessing hook failed to decode its input.
    Postprocess(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Input(msg) => write!(f, "invalid input: {msg}"),
            Error::Extractor(msg) => write!(f, "extractor failure: {msg}"),
            Error::InvalidRotation(deg) => {
                write!(f, "invalid rotation {deg} degrees, must be 0/90/180/270")
            }
            Error::WorkerFailed(msg) => write!(f, "worker failed: {msg}"),
            Error::Postprocess(msg) => write!(f, "postprocessing failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
