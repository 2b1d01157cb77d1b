use crate::Method;
use std::{error, fmt, io};

/// Errors surfaced to the embedding program.
///
/// Only construction-time failures reach the caller; every runtime failure is
/// confined to the worker that hit it and recovered by returning to accepting.
#[derive(Debug)]
pub enum Error {
    /// The reactor runtime could not be created.
    Runtime(io::Error),
    /// Binding or listening on the requested endpoint failed.
    Bind(io::Error),
    /// Two routes were registered for the same (path, method) pair.
    DuplicateEndpoint { path: String, method: Method },
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Runtime(err) | Error::Bind(err) => Some(err),
            Error::DuplicateEndpoint { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Runtime(err) => write!(f, "failed to create the reactor: {err}"),
            Error::Bind(err) => write!(f, "failed to bind the listener: {err}"),
            Error::DuplicateEndpoint { path, method } => {
                write!(f, "duplicate endpoint registration: {method} {path}")
            }
        }
    }
}

/// Per-request failures. None of these are reported to the client: the worker
/// closes the connection without a reply and returns to accepting.
#[derive(Debug, PartialEq)]
pub(crate) enum ErrorKind {
    InvalidMethod,
    InvalidTarget,
    InvalidVersion,
    InvalidHeader,
    InvalidContentLength,
    UnsupportedEncoding,
    HeadTooLarge,
    BodyTooLarge,
    InvalidEncoding,
    UnexpectedEof,
    Io(IoError),
}

impl error::Error for ErrorKind {}
impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

#[derive(Debug)]
pub(crate) struct IoError(pub(crate) io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}
