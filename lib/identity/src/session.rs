//! Session principal and the session payload carried between requests.
//!
//! After a successful login the user is reduced to a `SessionPrincipal`
//! (their local `UserId`). The `Session` wraps that principal with an
//! issue and expiry time; it is what the web layer stores in the signed
//! session cookie.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use signin_core::{ParseIdError, UserId};
use std::fmt;
use std::str::FromStr;

/// The minimal identifier persisted in the session to represent who is logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionPrincipal(UserId);

impl SessionPrincipal {
    /// Creates a principal for the given user ID.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self(user_id)
    }

    /// Returns the user ID this principal refers to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0
    }
}

impl fmt::Display for SessionPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionPrincipal {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserId::from_str(s).map(Self)
    }
}

impl From<UserId> for SessionPrincipal {
    fn from(user_id: UserId) -> Self {
        Self(user_id)
    }
}

/// An authenticated session.
///
/// Sessions are stateless on the server side: the whole value travels in a
/// signed cookie, so logout and expiry both amount to discarding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Who is logged in.
    principal: SessionPrincipal,
    /// When the session was established.
    issued_at: DateTime<Utc>,
    /// When the session expires.
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new session for the principal, valid for `duration`.
    #[must_use]
    pub fn new(principal: SessionPrincipal, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            principal,
            issued_at: now,
            expires_at: now + duration,
        }
    }

    /// Returns the session principal.
    #[must_use]
    pub fn principal(&self) -> SessionPrincipal {
        self.principal
    }

    /// Returns when the session was established.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns when the session expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the session is still valid (not expired).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}
