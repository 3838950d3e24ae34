//! Transport adapter: turns a resolved option map into one HTTP exchange.
//!
//! # Design
//! The request core never touches sockets. A `Transport` receives the fully
//! resolved `OptionMap` and hands back the raw payload (header block plus
//! body), the status code and the length of the header block. `UreqTransport`
//! is the default adapter; it builds a fresh agent per call so no connection
//! outlives `Request::execute`. Tests substitute their own `Transport`.
//!
//! Redirects are followed by `UreqTransport` itself rather than by the agent:
//! the payload carries one header block per hop, so a `Set-Cookie` sent on a
//! redirect response is still visible to `Response::cookies`.

use std::borrow::Cow;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::http::HttpMethod;
use crate::options::{OptionKey, OptionMap, OptionValue};

/// What a transport returns for a call that produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExchange {
    pub payload: Vec<u8>,
    pub status: u16,
    pub header_size: usize,
}

/// Executes one HTTP call described by a resolved option map.
pub trait Transport {
    fn perform(&self, options: &OptionMap) -> Result<RawExchange, TransportError>;
}

/// Typed view of the options a transport acts on.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSettings {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Prefix the payload with the reconstructed header block.
    pub include_header: bool,
    /// 0 disables redirect following.
    pub max_redirects: u32,
    pub connect_timeout: Option<Duration>,
    pub timeout: Option<Duration>,
    pub verify_peer: bool,
}

impl CallSettings {
    pub fn from_options(options: &OptionMap) -> Result<Self, TransportError> {
        let url = options
            .get(&OptionKey::Url)
            .and_then(OptionValue::as_text)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| TransportError::InvalidUrl(String::new()))?
            .to_string();

        let method = options
            .get(&OptionKey::CustomRequest)
            .and_then(OptionValue::as_text)
            .and_then(|m| m.parse::<HttpMethod>().ok())
            .unwrap_or_default();

        let flag = |key: OptionKey, default: bool| {
            options.get(&key).and_then(OptionValue::as_bool).unwrap_or(default)
        };
        let seconds = |key: OptionKey| {
            options
                .get(&key)
                .and_then(OptionValue::as_float)
                .filter(|s| *s > 0.0)
                .and_then(|s| Duration::try_from_secs_f64(s).ok())
        };

        let max_redirects = if flag(OptionKey::FollowLocation, true) {
            options
                .get(&OptionKey::MaxRedirs)
                .and_then(OptionValue::as_int)
                .map_or(10, |n| u32::try_from(n).unwrap_or(0))
        } else {
            0
        };

        let timeout = options
            .get(&OptionKey::TimeoutMs)
            .and_then(OptionValue::as_int)
            .filter(|ms| *ms > 0)
            .map(|ms| Duration::from_millis(ms.unsigned_abs()))
            .or_else(|| seconds(OptionKey::Timeout));

        let body = if flag(OptionKey::Post, false) {
            options
                .get(&OptionKey::PostFields)
                .and_then(OptionValue::as_bytes)
                .map(<[u8]>::to_vec)
        } else {
            None
        };

        Ok(Self {
            url,
            method,
            headers: collect_headers(options),
            body,
            include_header: flag(OptionKey::Header, true),
            max_redirects,
            connect_timeout: seconds(OptionKey::ConnectTimeout),
            timeout,
            verify_peer: flag(OptionKey::SslVerifyPeer, true),
        })
    }
}

fn collect_headers(options: &OptionMap) -> Vec<(String, String)> {
    let mut headers = Vec::new();

    for line in options
        .get(&OptionKey::HttpHeader)
        .and_then(OptionValue::as_list)
        .unwrap_or_default()
    {
        match line.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
            _ => warn!(line = %line, "skipping malformed header line"),
        }
    }

    let text = |key: OptionKey| {
        options
            .get(&key)
            .and_then(OptionValue::as_text)
            .filter(|v| !v.is_empty())
    };

    if let Some(credentials) = text(OptionKey::UserPassword) {
        headers.push((
            "Authorization".to_string(),
            format!("Basic {}", STANDARD.encode(basic_credentials(credentials).as_bytes())),
        ));
    }
    if let Some(cookie) = text(OptionKey::Cookie) {
        headers.push(("Cookie".to_string(), cookie.to_string()));
    }
    if let Some(encoding) = text(OptionKey::Encoding) {
        headers.push(("Accept-Encoding".to_string(), encoding.to_string()));
    }

    headers
}

/// A bare user name is sent with an empty password.
fn basic_credentials(credentials: &str) -> Cow<'_, str> {
    if credentials.contains(':') {
        Cow::Borrowed(credentials)
    } else {
        Cow::Owned(format!("{credentials}:"))
    }
}

/// Blocking transport backed by `ureq`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn perform(&self, options: &OptionMap) -> Result<RawExchange, TransportError> {
        let settings = CallSettings::from_options(options)?;
        debug!(
            method = %settings.method,
            url = %settings.url,
            max_redirects = settings.max_redirects,
            "performing HTTP call"
        );

        let mut config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .timeout_connect(settings.connect_timeout)
            .timeout_global(settings.timeout);
        if !settings.verify_peer {
            config = config.tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            );
        }
        let agent = config.build().new_agent();

        let mut url = settings.url.clone();
        let mut method = settings.method;
        let mut body = settings.body.clone();
        let mut payload = Vec::new();
        let mut hops = 0;
        let mut response = loop {
            let response = dispatch(&agent, method, &url, &settings.headers, body.as_deref())?;
            if settings.include_header {
                payload.extend(header_block(&response));
            }
            let Some(location) = redirect_location(&response) else {
                break response;
            };
            if settings.max_redirects == 0 {
                break response;
            }
            if hops == settings.max_redirects {
                return Err(TransportError::TooManyRedirects);
            }
            hops += 1;

            let status = response.status().as_u16();
            if (status == 303 && method != HttpMethod::Head)
                || (matches!(status, 301 | 302) && method == HttpMethod::Post)
            {
                method = HttpMethod::Get;
                body = None;
            }
            url = resolve_location(&url, location)?;
            debug!(hop = hops, status, url = %url, "following redirect");
        };

        let status = response.status();
        let header_size = payload.len();
        payload.extend(response.body_mut().with_config().limit(u64::MAX).read_to_vec()?);

        debug!(status = status.as_u16(), bytes = payload.len(), "HTTP call finished");
        Ok(RawExchange {
            payload,
            status: status.as_u16(),
            header_size,
        })
    }
}

fn dispatch(
    agent: &ureq::Agent,
    method: HttpMethod,
    url: &str,
    headers: &[(String, String)],
    body: Option<&[u8]>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match method {
        HttpMethod::Post => send(with_headers(agent.post(url), headers), body),
        HttpMethod::Put => send(with_headers(agent.put(url), headers), body),
        HttpMethod::Get => call(with_headers(agent.get(url), headers), body),
        HttpMethod::Delete => call(with_headers(agent.delete(url), headers), body),
        HttpMethod::Head => call(with_headers(agent.head(url), headers), body),
        HttpMethod::Options => call(with_headers(agent.options(url), headers), body),
    }
}

fn redirect_location(response: &ureq::http::Response<ureq::Body>) -> Option<&str> {
    if !response.status().is_redirection() {
        return None;
    }
    response
        .headers()
        .get(ureq::http::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .filter(|location| !location.is_empty())
}

/// Resolve a `Location` value against the URL that produced it.
fn resolve_location(base: &str, location: &str) -> Result<String, TransportError> {
    if location
        .parse::<ureq::http::Uri>()
        .is_ok_and(|uri| uri.scheme().is_some())
    {
        return Ok(location.to_string());
    }

    let uri: ureq::http::Uri = base
        .parse()
        .map_err(|_| TransportError::InvalidUrl(base.to_string()))?;
    let scheme = uri.scheme_str().unwrap_or("http");
    let authority = uri.authority().map_or("", |a| a.as_str());

    Ok(if let Some(rest) = location.strip_prefix("//") {
        format!("{scheme}://{rest}")
    } else if location.starts_with('/') {
        format!("{scheme}://{authority}{location}")
    } else {
        let dir = uri.path().rsplit_once('/').map_or("", |(dir, _)| dir);
        format!("{scheme}://{authority}{dir}/{location}")
    })
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&[u8]>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body),
        None => builder.send_empty(),
    }
}

/// Bodyless methods still carry a payload when one was set.
fn call(
    builder: ureq::RequestBuilder<ureq::typestate::WithoutBody>,
    body: Option<&[u8]>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.force_send_body().send(body),
        None => builder.call(),
    }
}

/// Rebuild the header block the way it appeared on the wire: status line,
/// one line per header, then the terminating blank line.
fn header_block(response: &ureq::http::Response<ureq::Body>) -> Vec<u8> {
    let status = response.status();
    let mut block = format!(
        "{:?} {} {}\r\n",
        response.version(),
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
    .into_bytes();
    for (name, value) in response.headers() {
        block.extend_from_slice(name.as_str().as_bytes());
        block.extend_from_slice(b": ");
        block.extend_from_slice(value.as_bytes());
        block.extend_from_slice(b"\r\n");
    }
    block.extend_from_slice(b"\r\n");
    block
}
