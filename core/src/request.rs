//! Fluent builder for a single outbound HTTP call.
//!
//! # Design
//! `Request` is an owned value; every setter consumes and returns it, so a
//! call reads as one chain ending in `execute`, which consumes the request.
//! Inputs are normalized instead of rejected: a URL without a scheme gets
//! `http://`, an unsupported method becomes GET. Transport options live in a
//! deep-merged `OptionMap`; URL, method, body and headers are injected last
//! when the options are resolved, overriding any same-named entry.

use tracing::{debug, warn};

use crate::cookie::ToCookieHeader;
use crate::http::HttpMethod;
use crate::merge::deep_merge;
use crate::options::{defaults, OptionKey, OptionMap, OptionValue};
use crate::response::Response;
use crate::transport::{Transport, UreqTransport};

/// Header lines as passed to `Request::set_headers`: one line or many.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList(pub Vec<String>);

impl From<&str> for HeaderList {
    fn from(line: &str) -> Self {
        HeaderList(vec![line.to_string()])
    }
}

impl From<String> for HeaderList {
    fn from(line: String) -> Self {
        HeaderList(vec![line])
    }
}

impl From<Vec<String>> for HeaderList {
    fn from(lines: Vec<String>) -> Self {
        HeaderList(lines)
    }
}

impl From<Vec<&str>> for HeaderList {
    fn from(lines: Vec<&str>) -> Self {
        HeaderList(lines.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for HeaderList {
    fn from(lines: &[&str]) -> Self {
        HeaderList(lines.iter().map(|l| l.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for HeaderList {
    fn from(lines: [&str; N]) -> Self {
        HeaderList(lines.iter().map(|l| l.to_string()).collect())
    }
}

/// Timeout as given to `Request::set_timeout`. Whole seconds and fractional
/// seconds end up under different option keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timeout {
    Seconds(i64),
    Fractional(f64),
}

impl From<i32> for Timeout {
    fn from(s: i32) -> Self {
        Timeout::Seconds(i64::from(s))
    }
}

impl From<i64> for Timeout {
    fn from(s: i64) -> Self {
        Timeout::Seconds(s)
    }
}

impl From<u32> for Timeout {
    fn from(s: u32) -> Self {
        Timeout::Seconds(i64::from(s))
    }
}

impl From<u64> for Timeout {
    fn from(s: u64) -> Self {
        Timeout::Seconds(i64::try_from(s).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Timeout {
    fn from(s: f64) -> Self {
        Timeout::Fractional(s)
    }
}

impl From<f32> for Timeout {
    fn from(s: f32) -> Self {
        Timeout::Fractional(f64::from(s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    url: String,
    method: HttpMethod,
    data: Option<Vec<u8>>,
    headers: Vec<String>,
    options: OptionMap,
    test_mode: bool,
}

impl Request {
    pub fn new(url: &str, method: &str) -> Self {
        Self {
            url: String::new(),
            method: HttpMethod::Get,
            data: None,
            headers: Vec::new(),
            options: defaults(),
            test_mode: false,
        }
        .set_url(url)
        .set_method(method)
    }

    pub fn get(url: &str) -> Self {
        Self::new(url, HttpMethod::Get.as_str())
    }

    pub fn post(url: &str, data: impl Into<Vec<u8>>) -> Self {
        Self::new(url, HttpMethod::Post.as_str()).set_post_data(data)
    }

    pub fn put(url: &str, data: impl Into<Vec<u8>>) -> Self {
        Self::new(url, HttpMethod::Put.as_str()).set_post_data(data)
    }

    pub fn delete(url: &str) -> Self {
        Self::new(url, HttpMethod::Delete.as_str())
    }

    pub fn head(url: &str) -> Self {
        Self::new(url, HttpMethod::Head.as_str())
    }

    pub fn options(url: &str) -> Self {
        Self::new(url, HttpMethod::Options.as_str())
    }

    /// Prefixes `http://` unless the URL already starts with `http://` or
    /// `https://`.
    #[must_use]
    pub fn set_url(mut self, url: &str) -> Self {
        self.url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("http://{url}")
        };
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Exact, case-sensitive match against the six supported methods.
    /// Anything else silently becomes GET.
    #[must_use]
    pub fn set_method(mut self, method: &str) -> Self {
        self.method = method.parse().unwrap_or_else(|err| {
            warn!(%err, "falling back to GET");
            HttpMethod::Get
        });
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Payload sent as the request body. Not checked against the method; an
    /// empty payload is treated as no payload.
    #[must_use]
    pub fn set_post_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn post_data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Replaces the header lines. Each line is a raw `Name: value` string.
    #[must_use]
    pub fn set_headers(mut self, headers: impl Into<HeaderList>) -> Self {
        self.headers = headers.into().0;
        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Deep-merges `options` into the current option map.
    #[must_use]
    pub fn set_options(mut self, options: &OptionMap) -> Self {
        self.options = deep_merge(std::mem::take(&mut self.options), options);
        self
    }

    pub fn get_options(&self) -> &OptionMap {
        &self.options
    }

    fn set_option(self, key: OptionKey, value: impl Into<OptionValue>) -> Self {
        self.set_options(&OptionMap::from([(key, value.into())]))
    }

    /// `user:password` credentials, sent as HTTP Basic authorization.
    #[must_use]
    pub fn set_user_password(self, user_password: &str) -> Self {
        self.set_option(OptionKey::UserPassword, user_password)
    }

    #[must_use]
    pub fn set_ssl_verify_peer(self, verify: bool) -> Self {
        self.set_option(OptionKey::SslVerifyPeer, verify)
    }

    /// Accepts a ready `Cookie` header value or parsed cookies; the latter
    /// are reduced to their `key=value` pairs.
    #[must_use]
    pub fn set_cookie<C: ToCookieHeader + ?Sized>(self, cookie: &C) -> Self {
        self.set_option(OptionKey::Cookie, cookie.to_cookie_header())
    }

    #[must_use]
    pub fn set_follow_location(self, follow: bool) -> Self {
        self.set_option(OptionKey::FollowLocation, follow)
    }

    #[must_use]
    pub fn set_max_redirs(self, max_redirs: u32) -> Self {
        self.set_option(OptionKey::MaxRedirs, max_redirs)
    }

    /// Whole seconds land under `Timeout`, fractional seconds under
    /// `TimeoutMs` as milliseconds. When both are present the transport
    /// uses `TimeoutMs`.
    #[must_use]
    pub fn set_timeout(self, timeout: impl Into<Timeout>) -> Self {
        match timeout.into() {
            Timeout::Seconds(secs) => self.set_option(OptionKey::Timeout, secs),
            Timeout::Fractional(secs) => {
                #[allow(clippy::cast_possible_truncation)]
                let millis = (secs * 1000.0).round() as i64;
                self.set_option(OptionKey::TimeoutMs, millis)
            }
        }
    }

    /// Accept-Encoding to request. An empty string accepts every encoding the
    /// transport can decode.
    #[must_use]
    pub fn set_encoding(self, encoding: &str) -> Self {
        self.set_option(OptionKey::Encoding, encoding)
    }

    /// When on, `execute` returns a canned `200 Ok` without any network I/O.
    #[must_use]
    pub fn set_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    /// Final option map handed to the transport.
    pub fn resolved_options(&self) -> OptionMap {
        let mut options = self.options.clone();
        options.insert(OptionKey::Url, self.url.clone().into());
        options.insert(OptionKey::CustomRequest, self.method.as_str().into());
        if let Some(data) = self.data.as_ref().filter(|d| !d.is_empty()) {
            options.insert(OptionKey::Post, true.into());
            options.insert(OptionKey::PostFields, data.clone().into());
        }
        if !self.headers.is_empty() {
            options.insert(OptionKey::HttpHeader, self.headers.clone().into());
        }
        options
    }

    /// Performs the call with the default `ureq` transport.
    pub fn execute(self) -> Response {
        self.execute_with(&UreqTransport)
    }

    /// Performs the call with the given transport. Transport failures are
    /// reported through the returned `Response`, never as a panic or `Err`.
    pub fn execute_with<T: Transport + ?Sized>(self, transport: &T) -> Response {
        if self.test_mode {
            debug!(method = %self.method, url = %self.url, "test mode, skipping transport");
            return Response::new("Ok", 200, 0);
        }

        let options = self.resolved_options();
        match transport.perform(&options) {
            Ok(exchange) => Response::new(exchange.payload, exchange.status, exchange.header_size),
            Err(err) => {
                warn!(method = %self.method, url = %self.url, code = err.code(), %err, "transport failed");
                Response::from_transport_error(&err)
            }
        }
    }
}
