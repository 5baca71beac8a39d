//! Cookie names and payload encoding shared by the auth routes and extractors.
//!
//! Payloads are JSON encoded as unpadded base64url so they only contain
//! cookie-safe characters. All auth cookies travel in the signed cookie jar.

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Serialize, de::DeserializeOwned};
use time::Duration as TimeDuration;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Auth state cookie name (for CSRF protection during the OAuth flow).
pub const AUTH_STATE_COOKIE: &str = "auth_state";

/// Lifetime of the auth state cookie.
pub const AUTH_STATE_MAX_AGE: TimeDuration = TimeDuration::minutes(10);

/// Encodes a payload for storage in a cookie.
pub fn encode<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(value)?))
}

/// Decodes a cookie payload, returning `None` if it is malformed.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Builds an HttpOnly cookie scoped to the whole site.
pub fn build(name: &'static str, value: String, max_age: TimeDuration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Builds a cookie that clears `name` in the browser.
pub fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}
