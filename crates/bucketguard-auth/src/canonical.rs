//! Canonical request construction for AWS Signature Version 4.
//!
//! The canonical request is the exact byte sequence a client signs:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Everything here works over ordered data so that identical inputs always
//! render identically.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, percent_encode};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Bytes percent-encoded in a canonical path.
///
/// Everything except the RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) and the path separator.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Whether header `name` is one of the `signed_headers` (case-insensitive).
///
/// # Examples
///
/// ```
/// use bucketguard_auth::canonical::include_header;
///
/// assert!(include_header("X-Amz-Date", &["host", "x-amz-date"]));
/// assert!(!include_header("range", &["host"]));
/// ```
#[must_use]
pub fn include_header(name: &str, signed_headers: &[&str]) -> bool {
    signed_headers
        .iter()
        .any(|signed| signed.eq_ignore_ascii_case(name))
}

/// Whether `byte` must be percent-encoded in a canonical path.
#[must_use]
pub fn should_escape(byte: u8) -> bool {
    !(byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~' | b'/'))
}

/// Percent-encode a request path for signing.
///
/// Every byte except unreserved characters and `/` is encoded with uppercase
/// hex digits.
///
/// # Examples
///
/// ```
/// use bucketguard_auth::canonical::escape_path;
///
/// assert_eq!(escape_path("/bucket-*(/test=key&"), "/bucket-%2A%28/test%3Dkey%26");
/// assert_eq!(escape_path("/test~bucket/test.key"), "/test~bucket/test.key");
/// ```
#[must_use]
pub fn escape_path(path: &str) -> String {
    percent_encode(path.as_bytes(), PATH_ENCODE_SET).to_string()
}

/// A request reduced to exactly what its signature covers.
///
/// # Examples
///
/// ```
/// use bucketguard_auth::canonical::CanonicalRequest;
///
/// let request = CanonicalRequest::new(
///     "GET",
///     "/test.txt",
///     "",
///     &[("Host", "examplebucket.s3.amazonaws.com"), ("User-Agent", "curl")],
///     &["host"],
///     "UNSIGNED-PAYLOAD",
/// );
/// assert_eq!(request.headers().len(), 1);
/// assert!(request.canonical_string().starts_with("GET\n/test.txt\n\nhost:"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    method: String,
    path: String,
    query: String,
    headers: Vec<(String, String)>,
    signed_headers: Vec<String>,
    payload_hash: String,
}

impl CanonicalRequest {
    /// Build a canonical request from raw components.
    ///
    /// `path` is the decoded request path; it is escaped here. Only headers
    /// named in `signed_headers` are retained, in input order.
    #[must_use]
    pub fn new(
        method: &str,
        path: &str,
        query: &str,
        headers: &[(&str, &str)],
        signed_headers: &[&str],
        payload_hash: &str,
    ) -> Self {
        Self::with_escaped_path(
            method,
            escape_path(path),
            query,
            headers,
            signed_headers,
            payload_hash,
        )
    }

    fn with_escaped_path(
        method: &str,
        path: String,
        query: &str,
        headers: &[(&str, &str)],
        signed_headers: &[&str],
        payload_hash: &str,
    ) -> Self {
        let path = if path.is_empty() { "/".to_owned() } else { path };

        let headers = headers
            .iter()
            .filter(|(name, _)| include_header(name, signed_headers))
            .map(|(name, value)| (name.to_ascii_lowercase(), (*value).to_owned()))
            .collect();

        let mut signed: Vec<String> = signed_headers
            .iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        signed.sort_unstable();
        signed.dedup();

        Self {
            method: method.to_owned(),
            path,
            query: canonical_query_string(query),
            headers,
            signed_headers: signed,
            payload_hash: payload_hash.to_owned(),
        }
    }

    /// Reassemble the canonical request from captured request parts.
    ///
    /// The wire path is percent-decoded to raw bytes before escaping so that
    /// clients that already encoded their path are not double-encoded, and
    /// bytes that are not valid UTF-8 survive unchanged. A missing `host`
    /// header falls back to the URI authority.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingHeader`] if a signed header is absent and
    /// [`AuthError::InvalidHeaderValue`] if one is not valid text.
    pub fn from_parts(
        parts: &http::request::Parts,
        signed_headers: &[&str],
        payload_hash: &str,
    ) -> Result<Self, AuthError> {
        let mut names: Vec<String> = signed_headers
            .iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        names.sort_unstable();
        names.dedup();

        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(names.len());
        for name in &names {
            let name = name.as_str();
            let mut found = false;
            for value in parts.headers.get_all(name) {
                let value = value
                    .to_str()
                    .map_err(|_| AuthError::InvalidHeaderValue(name.to_owned()))?;
                pairs.push((name, value));
                found = true;
            }
            if found {
                continue;
            }

            match parts.uri.authority() {
                Some(authority) if name == "host" => {
                    pairs.push((name, authority.as_str()));
                }
                _ => return Err(AuthError::MissingHeader(name.to_owned())),
            }
        }

        let decoded: Vec<u8> = percent_decode_str(parts.uri.path()).collect();

        Ok(Self::with_escaped_path(
            parts.method.as_str(),
            percent_encode(&decoded, PATH_ENCODE_SET).to_string(),
            parts.uri.query().unwrap_or(""),
            &pairs,
            signed_headers,
            payload_hash,
        ))
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The escaped path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The retained headers, lower-cased, in input order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The sorted, lower-cased signed header names.
    #[must_use]
    pub fn signed_headers(&self) -> &[String] {
        &self.signed_headers
    }

    /// Render the canonical request string.
    #[must_use]
    pub fn canonical_string(&self) -> String {
        let mut merged: BTreeMap<&str, String> = BTreeMap::new();
        for (name, value) in &self.headers {
            let value = collapse_whitespace(value.trim());
            merged
                .entry(name.as_str())
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        let canonical_headers = self
            .signed_headers
            .iter()
            .filter_map(|name| {
                merged
                    .get(name.as_str())
                    .map(|value| format!("{name}:{value}"))
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{}\n{}\n{}\n{canonical_headers}\n\n{}\n{}",
            self.method,
            self.path,
            self.query,
            self.signed_headers.join(";"),
            self.payload_hash,
        )
    }

    /// Hex-encoded SHA-256 of [`canonical_string`](Self::canonical_string).
    #[must_use]
    pub fn hash(&self) -> String {
        hex::encode(Sha256::digest(self.canonical_string().as_bytes()))
    }
}

/// Sort query parameters by key, then by value.
///
/// Raw values are preserved as sent: clients disagree on which characters
/// they encode, and the server must sign exactly what appeared on the wire.
///
/// # Examples
///
/// ```
/// use bucketguard_auth::canonical::canonical_query_string;
///
/// assert_eq!(canonical_query_string("b=2&a=1"), "a=1&b=2");
/// assert_eq!(canonical_query_string("acl"), "acl=");
/// ```
#[must_use]
pub fn canonical_query_string(query: &str) -> String {
    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .collect();
    params.sort_unstable();

    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Collapse runs of whitespace to a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
            }
            prev_was_space = true;
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
