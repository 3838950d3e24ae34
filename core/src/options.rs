//! Typed transport options.
//!
//! # Design
//! Options are a map from a closed set of well-known keys to loosely typed
//! values, so overlays can be deep-merged without knowing what each key
//! means. `Custom` keys carry caller-defined groups; only `Map` values recurse
//! during a merge. Keys serialize as snake_case strings so an overlay can be
//! written as a plain JSON object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered option map. Ordering keeps `Debug` output and JSON stable.
pub type OptionMap = BTreeMap<OptionKey, OptionValue>;

/// Accept-Encoding value that asks the server for gzip only.
pub const ENCODING_GZIP: &str = "gzip";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OptionKey {
    ReturnTransfer,
    FollowLocation,
    /// Include the header block in the raw payload.
    Header,
    MaxRedirs,
    /// Connect timeout in seconds.
    ConnectTimeout,
    /// Whole-call timeout in seconds.
    Timeout,
    /// Whole-call timeout in milliseconds. Wins over `Timeout` when both are set.
    TimeoutMs,
    Encoding,
    /// `user:password` sent as HTTP Basic credentials.
    UserPassword,
    SslVerifyPeer,
    Cookie,
    Url,
    CustomRequest,
    Post,
    PostFields,
    HttpHeader,
    Custom(String),
}

static NAMED_KEYS: [(OptionKey, &str); 16] = [
    (OptionKey::ReturnTransfer, "return_transfer"),
    (OptionKey::FollowLocation, "follow_location"),
    (OptionKey::Header, "header"),
    (OptionKey::MaxRedirs, "max_redirs"),
    (OptionKey::ConnectTimeout, "connect_timeout"),
    (OptionKey::Timeout, "timeout"),
    (OptionKey::TimeoutMs, "timeout_ms"),
    (OptionKey::Encoding, "encoding"),
    (OptionKey::UserPassword, "user_password"),
    (OptionKey::SslVerifyPeer, "ssl_verify_peer"),
    (OptionKey::Cookie, "cookie"),
    (OptionKey::Url, "url"),
    (OptionKey::CustomRequest, "custom_request"),
    (OptionKey::Post, "post"),
    (OptionKey::PostFields, "post_fields"),
    (OptionKey::HttpHeader, "http_header"),
];

impl OptionKey {
    pub fn name(&self) -> &str {
        match self {
            OptionKey::Custom(name) => name,
            key => NAMED_KEYS
                .iter()
                .find(|(k, _)| k == key)
                .map_or("", |(_, name)| *name),
        }
    }
}

impl From<String> for OptionKey {
    fn from(name: String) -> Self {
        NAMED_KEYS
            .iter()
            .find(|(_, n)| *n == name)
            .map_or(OptionKey::Custom(name), |(k, _)| k.clone())
    }
}

impl From<&str> for OptionKey {
    fn from(name: &str) -> Self {
        OptionKey::from(name.to_string())
    }
}

impl From<OptionKey> for String {
    fn from(key: OptionKey) -> Self {
        key.name().to_string()
    }
}

/// A single option value. Only `Map` takes part in recursive merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<String>),
    Map(OptionMap),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            OptionValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Numeric value as `f64`; integers widen.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            OptionValue::Float(f) => Some(*f),
            OptionValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            OptionValue::Bytes(b) => Some(b),
            OptionValue::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            OptionValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&OptionMap> {
        match self {
            OptionValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Int(i)
    }
}

impl From<i32> for OptionValue {
    fn from(i: i32) -> Self {
        OptionValue::Int(i64::from(i))
    }
}

impl From<u32> for OptionValue {
    fn from(i: u32) -> Self {
        OptionValue::Int(i64::from(i))
    }
}

impl From<f64> for OptionValue {
    fn from(f: f64) -> Self {
        OptionValue::Float(f)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

impl From<Vec<u8>> for OptionValue {
    fn from(b: Vec<u8>) -> Self {
        OptionValue::Bytes(b)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(l: Vec<String>) -> Self {
        OptionValue::List(l)
    }
}

impl From<OptionMap> for OptionValue {
    fn from(m: OptionMap) -> Self {
        OptionValue::Map(m)
    }
}

/// Options every new request starts from.
pub fn defaults() -> OptionMap {
    OptionMap::from([
        (OptionKey::ReturnTransfer, OptionValue::Bool(true)),
        (OptionKey::FollowLocation, OptionValue::Bool(true)),
        (OptionKey::Header, OptionValue::Bool(true)),
        (OptionKey::MaxRedirs, OptionValue::Int(10)),
        (OptionKey::ConnectTimeout, OptionValue::Int(30)),
        (OptionKey::Timeout, OptionValue::Int(30)),
        (OptionKey::Encoding, OptionValue::Text(String::new())),
    ])
}

/// Parse an option overlay from a JSON object.
pub fn from_json(json: &str) -> Result<OptionMap, serde_json::Error> {
    serde_json::from_str(json)
}
