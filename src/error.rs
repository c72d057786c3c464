//! Unified error type.

use std::fmt;

/// The error type returned by faultline's fallible operations.
///
/// Application-level outcomes (404, 400 for a malformed control request,
/// a replayed 503) are expressed as HTTP [`Response`](crate::Response)
/// values, not as `Error`s. This type surfaces infrastructure failures:
/// binding a port, accepting a connection, or reading a request body.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Body(hyper::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e)   => write!(f, "io: {e}"),
            Self::Body(e) => write!(f, "reading request body: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e)   => Some(e),
            Self::Body(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<hyper::Error> for Error {
    fn from(e: hyper::Error) -> Self {
        Self::Body(e)
    }
}
