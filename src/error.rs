//! Failure taxonomy for the client.
//!
//! Every phase of a request (URL resolution, connect, write, read, parse,
//! decode, event dispatch) reports one of these variants directly. The retry
//! policy only ever looks at [`Error::kind`], never at the rendered message.

use std::io;

use crate::http::parser::ParseError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request target is not an absolute http/https URL with a host.
    #[error("malformed url: {0}")]
    MalformedUrl(String),

    /// Connection establishment (resolve + connect + handshake) took longer
    /// than `connect_timeout`.
    #[error("connect timeout")]
    ConnectTimeout,

    /// A single read did not complete within `read_timeout`.
    #[error("read timeout")]
    ReadTimeout,

    /// Refused, reset, broken pipe, unreachable or name resolution failure.
    #[error("connection error: {0}")]
    Connection(#[source] io::Error),

    /// TLS configuration, handshake or certificate failure.
    #[error("tls error: {0}")]
    Tls(String),

    /// Malformed status line, headers or an incomplete response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The body claimed a content coding it could not be decoded with.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// An SSE event handler returned an error; the stream was aborted.
    #[error("event handler error: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Classification consumed by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connection,
    Other,
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::ConnectTimeout | Error::ReadTimeout => FailureKind::Timeout,
            Error::Connection(_) => FailureKind::Connection,
            _ => FailureKind::Other,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == FailureKind::Timeout
    }

    pub fn is_connection(&self) -> bool {
        self.kind() == FailureKind::Connection
    }

    /// Maps an I/O error raised while reading a response.
    ///
    /// Blocking sockets report an expired read timeout as `WouldBlock` on
    /// unix and `TimedOut` on windows.
    pub(crate) fn from_read(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Error::ReadTimeout,
            _ => Error::Connection(err),
        }
    }

    /// Maps an I/O error raised while connecting or performing a TLS handshake.
    pub(crate) fn from_connect(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Error::ConnectTimeout,
            // rustls surfaces alerts and certificate failures as InvalidData
            io::ErrorKind::InvalidData => Error::Tls(err.to_string()),
            _ => Error::Connection(err),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::MalformedUrl(err.to_string())
    }
}
