//! Error types for the request core.
//!
//! # Design
//! `execute` never returns these to the caller. A `TransportError` is folded
//! into the `Response` as an error code plus description, and
//! `ParseMethodError` is swallowed by the builder's GET fallback. Codes follow
//! libcurl's numbering so logs read the same as the curl tooling they replace.

use thiserror::Error;

/// The given string is not one of the six supported HTTP methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported HTTP method: {0:?}")]
pub struct ParseMethodError(pub String);

/// Failure below the HTTP layer: no usable response was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("malformed URL: {0}")]
    InvalidUrl(String),

    #[error("could not resolve host")]
    HostNotFound,

    #[error("failed to connect to host")]
    ConnectionFailed,

    #[error("operation timed out")]
    Timeout,

    #[error("maximum redirects followed")]
    TooManyRedirects,

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("failure receiving network data: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// Stable numeric code carried on the `Response`.
    pub fn code(&self) -> i32 {
        match self {
            TransportError::Other(_) => 2,
            TransportError::InvalidUrl(_) => 3,
            TransportError::HostNotFound => 6,
            TransportError::ConnectionFailed => 7,
            TransportError::Timeout => 28,
            TransportError::Tls(_) => 35,
            TransportError::TooManyRedirects => 47,
            TransportError::Io(_) => 56,
        }
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::BadUri(uri) => TransportError::InvalidUrl(uri),
            ureq::Error::HostNotFound => TransportError::HostNotFound,
            ureq::Error::ConnectionFailed => TransportError::ConnectionFailed,
            ureq::Error::Timeout(_) => TransportError::Timeout,
            ureq::Error::TooManyRedirects => TransportError::TooManyRedirects,
            ureq::Error::Tls(msg) => TransportError::Tls(msg.to_string()),
            ureq::Error::Io(io) => TransportError::Io(io),
            other => TransportError::Other(other.to_string()),
        }
    }
}
