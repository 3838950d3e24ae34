//! Minimal HTTP request/response core.
//!
//! # Overview
//! `Request` accumulates the configuration of one outbound call (URL, method,
//! headers, body, transport options) and hands the resolved option map to a
//! `Transport` when executed. The transport returns the raw payload plus
//! side-channel metadata, which `Response` splits into header lines, cookies
//! and body, and classifies as success or error.
//!
//! # Design
//! - Inputs are normalized, never rejected: missing URL schemes become
//!   `http://`, unsupported methods become GET.
//! - Options form a typed map that is deep-merged on every `set_options`.
//! - `execute` never fails. Transport errors are carried on the `Response`
//!   as a numeric code plus description.
//! - Network I/O lives behind the `Transport` trait; `UreqTransport` is the
//!   default and tests substitute their own.

pub mod cookie;
pub mod error;
pub mod http;
pub mod merge;
pub mod options;
pub mod request;
pub mod response;
pub mod transport;

pub use cookie::{Cookie, CookiePair, ToCookieHeader};
pub use error::{ParseMethodError, TransportError};
pub use http::HttpMethod;
pub use merge::{deep_merge, deep_merge_all};
pub use options::{OptionKey, OptionMap, OptionValue, ENCODING_GZIP};
pub use request::{HeaderList, Request, Timeout};
pub use response::Response;
pub use transport::{CallSettings, RawExchange, Transport, UreqTransport};
