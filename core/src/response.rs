//! Snapshot of one completed or failed call.
//!
//! # Design
//! A `Response` is built from whatever the transport handed back: the raw
//! payload (header block followed by body), the status code, the byte length
//! of the header block and an optional transport error. Header lines are
//! split once at construction; cookies and body are derived on demand.
//! Success is decided from the leading digit of the status code, so a
//! missing status (0) reads as an error even without a transport error.

use std::borrow::Cow;

use crate::cookie::{cookie_header, Cookie};
use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    raw: Vec<u8>,
    status: u16,
    header_size: usize,
    header: Vec<String>,
    error_code: Option<i32>,
    error_description: String,
}

impl Response {
    pub fn new(raw: impl Into<Vec<u8>>, status: u16, header_size: usize) -> Self {
        Self::with_error(raw, status, header_size, None, String::new())
    }

    pub fn with_error(
        raw: impl Into<Vec<u8>>,
        status: u16,
        header_size: usize,
        error_code: Option<i32>,
        error_description: impl Into<String>,
    ) -> Self {
        let raw = raw.into();
        let header_size = header_size.min(raw.len());
        let header = String::from_utf8_lossy(&raw[..header_size])
            .split('\n')
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();
        Self {
            raw,
            status,
            header_size,
            header,
            error_code,
            error_description: error_description.into(),
        }
    }

    /// Response for a call that never produced an HTTP exchange.
    pub fn from_transport_error(err: &TransportError) -> Self {
        Self::with_error(Vec::new(), 0, 0, Some(err.code()), err.to_string())
    }

    /// Header block followed by body, exactly as received.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Header block split on line breaks. Includes the status line and the
    /// trailing blank lines that terminate each header block.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// One record per `Set-Cookie` line, in order of appearance.
    pub fn cookies(&self) -> Vec<Cookie> {
        self.header
            .iter()
            .filter_map(|line| Cookie::parse_header_line(line))
            .collect()
    }

    /// Cookies re-serialized as a `Cookie` request header value, ready to be
    /// passed to `Request::set_cookie`.
    pub fn cookie_string(&self) -> String {
        cookie_header(&self.cookies())
    }

    /// Body bytes, i.e. everything after the header block.
    pub fn data(&self) -> &[u8] {
        &self.raw[self.header_size..]
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.data())
    }

    pub fn http_status_code(&self) -> u16 {
        self.status
    }

    pub fn is_error(&self) -> bool {
        let leading = self.status.to_string().chars().next();
        !matches!(leading, Some('2' | '3')) || self.error_code.is_some()
    }

    pub fn is_success(&self) -> bool {
        !self.is_error()
    }

    pub fn error_code(&self) -> Option<i32> {
        self.error_code
    }

    pub fn error_description(&self) -> &str {
        &self.error_description
    }
}
