// ABOUTME: HTTP cookie helpers for the session token
// ABOUTME: Builds httpOnly Set-Cookie values and extracts cookies from requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Session cookie helpers.
//!
//! The session token travels in an `httpOnly` cookie so browser scripts
//! cannot read it. The `Secure` flag follows the `CIRRUS_BASE_URL`
//! environment variable: `https://` deployments (and unset, fail-secure)
//! get `Secure`, plain-HTTP development does not.

use std::env;

use axum::http::{header, HeaderMap, HeaderValue};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session_token";

/// Set the session cookie on a response.
pub fn set_session_cookie(headers: &mut HeaderMap, token: &str, max_age_secs: i64) {
    use std::fmt::Write;

    let mut cookie = format!("{SESSION_COOKIE}={token}");
    let _ = write!(cookie, "; Max-Age={max_age_secs}");
    cookie.push_str("; Path=/; HttpOnly; SameSite=Lax");
    if infer_secure_flag() {
        cookie.push_str("; Secure");
    }

    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }
}

/// Clear the session cookie on a response.
pub fn clear_session_cookie(headers: &mut HeaderMap) {
    let mut cookie = format!("{SESSION_COOKIE}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax");
    if infer_secure_flag() {
        cookie.push_str("; Secure");
    }

    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }
}

/// Extract a cookie value from request headers.
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let mut parts = cookie.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            let value = parts.next()?.trim();

            if name == cookie_name {
                Some(value.to_owned())
            } else {
                None
            }
        })
}

/// `Secure` only makes sense over HTTPS; unset defaults to secure.
fn infer_secure_flag() -> bool {
    env::var("CIRRUS_BASE_URL").map_or(true, |url| url.starts_with("https://"))
}
