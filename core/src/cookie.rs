//! `Set-Cookie` parsing and `Cookie` header serialization.
//!
//! # Design
//! Parsing is deliberately loose. Each `Set-Cookie` line yields exactly one
//! record; segments whose key is a known attribute fill the attribute fields
//! and every other segment overwrites the primary pair, so the last
//! non-attribute segment wins. Serialization emits only primary pairs, which
//! means attributes do not survive a parse/serialize round trip.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

const SET_COOKIE_PREFIX: &str = "set-cookie:";

/// The `name=value` part of a cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookiePair {
    pub key: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
}

impl CookiePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One parsed `Set-Cookie` line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Primary pair. `None` when the line held only attributes.
    #[serde(default)]
    pub value: Option<CookiePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Unix timestamp in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, alias = "HttpOnly")]
    pub httponly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Cookie {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value: Some(CookiePair::new(key, value)),
            ..Self::default()
        }
    }

    /// Parse a raw header line. Returns `None` unless the line is a
    /// `Set-Cookie` header (name matched case-insensitively).
    pub fn parse_header_line(line: &str) -> Option<Self> {
        let line = line.trim();
        let prefix = line.get(..SET_COOKIE_PREFIX.len())?;
        if !prefix.eq_ignore_ascii_case(SET_COOKIE_PREFIX) {
            return None;
        }
        Some(Self::parse(&line[SET_COOKIE_PREFIX.len()..]))
    }

    /// Parse a `Set-Cookie` header value.
    pub fn parse(value: &str) -> Self {
        let mut cookie = Cookie::default();
        for segment in value.split(';') {
            if segment.trim().is_empty() {
                continue;
            }
            let (key, val) = segment.split_once('=').unwrap_or((segment, ""));
            let key = key.trim();
            let val = val.trim();
            match key.to_ascii_lowercase().as_str() {
                "domain" => cookie.domain = Some(val.to_string()),
                "path" => cookie.path = Some(val.to_string()),
                "comment" => cookie.comment = Some(val.to_string()),
                "expires" => cookie.expires = parse_cookie_date(val),
                "secure" => cookie.secure = true,
                "httponly" => cookie.httponly = true,
                _ => cookie.value = Some(CookiePair::new(key, val)),
            }
        }
        cookie
    }
}

/// Join the primary pairs as a `Cookie` request header value. Records without
/// a primary pair are skipped.
pub fn cookie_header(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .filter_map(|c| c.value.as_ref())
        .map(|pair| format!("{}={}", pair.key, pair.value))
        .collect::<Vec<_>>()
        .join("; ")
        .trim()
        .to_string()
}

/// Anything that can become a `Cookie` request header value.
pub trait ToCookieHeader {
    fn to_cookie_header(&self) -> String;
}

impl ToCookieHeader for str {
    fn to_cookie_header(&self) -> String {
        self.to_string()
    }
}

impl ToCookieHeader for String {
    fn to_cookie_header(&self) -> String {
        self.clone()
    }
}

impl ToCookieHeader for [Cookie] {
    fn to_cookie_header(&self) -> String {
        cookie_header(self)
    }
}

impl ToCookieHeader for Vec<Cookie> {
    fn to_cookie_header(&self) -> String {
        cookie_header(self)
    }
}

/// Parse an `Expires` attribute into a Unix timestamp.
///
/// Accepts IMF-fixdate, the dashed Netscape/RFC 850 forms, asctime and
/// RFC 2822. Anything else yields `None`.
pub fn parse_cookie_date(date: &str) -> Option<i64> {
    const NAIVE_FORMATS: [&str; 5] = [
        "%a, %d %b %Y %H:%M:%S GMT",
        "%a, %d-%b-%Y %H:%M:%S GMT",
        "%A, %d-%b-%y %H:%M:%S GMT",
        "%a, %d-%b-%y %H:%M:%S GMT",
        "%a %b %e %H:%M:%S %Y",
    ];

    let date = date.trim();
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(date, fmt).ok())
        .map(|dt| dt.and_utc().timestamp())
        .or_else(|| DateTime::parse_from_rfc2822(date).ok().map(|dt| dt.timestamp()))
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
        Raw::Bool(b) => b.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primary_pair_and_attributes() {
        let cookie = Cookie::parse_header_line("Set-Cookie: PREF=ID; Path=/; Domain=.google.ru").unwrap();
        assert_eq!(cookie.value, Some(CookiePair::new("PREF", "ID")));
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert_eq!(cookie.domain.as_deref(), Some(".google.ru"));
        assert!(!cookie.secure);
        assert!(!cookie.httponly);
    }

    #[test]
    fn header_name_is_case_insensitive() {
        assert!(Cookie::parse_header_line("set-cookie: a=b").is_some());
        assert!(Cookie::parse_header_line("SET-COOKIE:a=b\r").is_some());
        assert!(Cookie::parse_header_line("Set-Cookie2: a=b").is_none());
        assert!(Cookie::parse_header_line("Content-Type: text/html").is_none());
        assert!(Cookie::parse_header_line("").is_none());
    }

    #[test]
    fn flags_become_true_and_expires_is_a_timestamp() {
        let cookie = Cookie::parse(
            "NID=67; expires=Wed, 06-Aug-2014 17:29:02 GMT; path=/; domain=.google.ru; Secure; HttpOnly",
        );
        assert_eq!(cookie.value, Some(CookiePair::new("NID", "67")));
        assert_eq!(cookie.expires, Some(1_407_346_142));
        assert!(cookie.secure);
        assert!(cookie.httponly);
    }

    #[test]
    fn last_non_attribute_segment_wins() {
        let cookie = Cookie::parse("a=1; Path=/; b=2");
        assert_eq!(cookie.value, Some(CookiePair::new("b", "2")));
        assert_eq!(cookie.path.as_deref(), Some("/"));
    }

    #[test]
    fn value_is_split_on_first_equals_only() {
        let cookie = Cookie::parse("token=a=b=c");
        assert_eq!(cookie.value, Some(CookiePair::new("token", "a=b=c")));
    }

    #[test]
    fn segment_without_equals_has_empty_value() {
        let cookie = Cookie::parse("lonely; comment");
        assert_eq!(cookie.value, Some(CookiePair::new("lonely", "")));
        assert_eq!(cookie.comment.as_deref(), Some(""));
    }

    #[test]
    fn unparseable_expires_is_none() {
        assert_eq!(Cookie::parse("a=b; expires=never").expires, None);
    }

    #[test]
    fn parses_common_date_forms() {
        let expected = Some(1_454_606_942);
        assert_eq!(parse_cookie_date("Thu, 04 Feb 2016 17:29:02 GMT"), expected);
        assert_eq!(parse_cookie_date("Thu, 04-Feb-2016 17:29:02 GMT"), expected);
        assert_eq!(parse_cookie_date("Thursday, 04-Feb-16 17:29:02 GMT"), expected);
        assert_eq!(parse_cookie_date("Thu Feb  4 17:29:02 2016"), expected);
        assert_eq!(parse_cookie_date("Thu, 04 Feb 2016 18:29:02 +0100"), expected);
    }

    #[test]
    fn serializes_primary_pairs_only() {
        let cookies = vec![
            Cookie {
                value: Some(CookiePair::new("PREF", "ID")),
                expires: Some(1_454_606_942),
                path: Some("/".into()),
                domain: Some(".google.ru".into()),
                ..Cookie::default()
            },
            Cookie {
                domain: Some("attributes-only".into()),
                ..Cookie::default()
            },
            Cookie {
                httponly: true,
                ..Cookie::new("NID", "67")
            },
        ];
        assert_eq!(cookies.to_cookie_header(), "PREF=ID; NID=67");
        assert_eq!(cookie_header(&[]), "");
    }

    #[test]
    fn structured_input_accepts_numeric_values() {
        let cookies: Vec<Cookie> = serde_json::from_str(
            r#"[{"value":{"key":"NID","value":67},"expires":1407346142,"path":"/","domain":".google.ru","HttpOnly":true}]"#,
        )
        .unwrap();
        assert_eq!(cookies[0].value, Some(CookiePair::new("NID", "67")));
        assert!(cookies[0].httponly);
        assert_eq!(cookie_header(&cookies), "NID=67");
    }
}
