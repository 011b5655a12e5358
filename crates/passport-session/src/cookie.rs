//! Session cookie reading and `Set-Cookie` rendering.
//!
//! The session identifier travels in one cookie with a configurable name,
//! path `/` and an optional domain. Values are URL-escaped on the way out
//! and unescaped on the way in.

use axum::http::{HeaderMap, HeaderValue, header};
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// `Expires` attribute format (RFC 7231 IMF-fixdate).
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Find the raw value of cookie `name` in the request headers.
///
/// Looks through every `Cookie` header and returns the first match with
/// surrounding double quotes removed. The value is still escaped.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| {
            let value = value.trim();
            value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value)
                .to_string()
        })
}

/// URL-escape a cookie value.
pub fn escape(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Reverse [`escape`]. `+` is accepted as an encoded space.
///
/// Fails on a `%` not followed by two hex digits or on escapes that do not
/// decode to UTF-8.
pub fn unescape(value: &str) -> Result<String> {
    let bytes = value.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'%' {
            let well_formed = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !well_formed {
                return Err(Error::CookieDecode(format!(
                    "invalid escape at offset {i} in {value:?}"
                )));
            }
        }
    }

    let spaced = value.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::CookieDecode(e.to_string()))
}

/// Render the `Set-Cookie` value issued for a new session.
///
/// `Max-Age` is only emitted for a non-negative `max_age`; a negative value
/// leaves the cookie scoped to the browser session.
pub fn session_cookie(name: &str, session_id: &str, domain: &str, max_age: i64) -> String {
    let mut cookie = format!("{}={}; Path=/", name, escape(session_id));
    if !domain.is_empty() {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    if max_age >= 0 {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    cookie
}

/// Render the `Set-Cookie` value that makes the client drop its session
/// cookie: empty value, immediate expiry, `HttpOnly`.
pub fn clearing_cookie(name: &str, domain: &str, now: DateTime<Utc>) -> String {
    let mut cookie = format!("{name}=; Path=/");
    if !domain.is_empty() {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    cookie.push_str(&format!(
        "; Expires={}; Max-Age=0; HttpOnly",
        now.format(HTTP_DATE_FORMAT)
    ));
    cookie
}

/// Convert a rendered cookie into a header value.
pub fn set_cookie_value(cookie: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(cookie)
        .map_err(|e| Error::InvalidConfig(format!("invalid Set-Cookie value: {e}")))
}

/// Append a rendered cookie to the response headers.
pub fn append_set_cookie(headers: &mut HeaderMap, cookie: &str) -> Result<()> {
    headers.append(header::SET_COOKIE, set_cookie_value(cookie)?);
    Ok(())
}

/// Check that a cookie name and domain can be carried in `Set-Cookie`.
///
/// The name must be a non-empty token: no separators, whitespace or
/// control characters.
pub fn validate_attributes(name: &str, domain: &str) -> Result<()> {
    let bad_name = name.is_empty()
        || name.chars().any(|c| {
            !c.is_ascii() || c.is_ascii_control() || c.is_whitespace() || "=;,\"".contains(c)
        });
    if bad_name {
        return Err(Error::InvalidConfig(format!("invalid cookie name: {name:?}")));
    }

    if domain.chars().any(|c| c.is_ascii_control() || c.is_whitespace() || c == ';') {
        return Err(Error::InvalidConfig(format!("invalid cookie domain: {domain:?}")));
    }

    set_cookie_value(&session_cookie(name, "", domain, 0)).map(|_| ())
}
