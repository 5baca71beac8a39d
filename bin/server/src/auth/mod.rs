//! Authentication module for the signin server.
//!
//! This module provides:
//! - The Google OAuth2 strategy, built once and injected via [`AppState`]
//! - Login, callback, and logout routes
//! - Signed-cookie sessions holding only the session principal
//! - Authentication extractors for Axum routes
//!
//! Sessions are not stored server-side. The signed session cookie carries the
//! principal and its expiry; every authenticated request maps the principal
//! back to a user through the binder, so a deleted user is logged out on
//! their next request.

pub mod cookie;
pub mod google;
pub mod middleware;
pub mod routes;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use signin_identity::OAuthBinder;
use std::sync::Arc;

use crate::config::SessionConfig;

pub use google::{GoogleOAuthError, GoogleStrategy};
pub use middleware::{OptionalAuth, RequireAuth};
pub use routes::{callback, login, logout};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Binds provider identities to local users.
    pub binder: Arc<OAuthBinder>,
    /// Google sign-in strategy.
    pub google: Arc<GoogleStrategy>,
    /// Session configuration.
    pub session_config: SessionConfig,
    /// Path Google redirects back to.
    pub callback_path: String,
    /// Key used to sign auth cookies.
    cookie_key: Key,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        binder: Arc<OAuthBinder>,
        google: Arc<GoogleStrategy>,
        session_config: SessionConfig,
        callback_path: String,
        cookie_key: Key,
    ) -> Self {
        Self {
            binder,
            google,
            session_config,
            callback_path,
            cookie_key,
        }
    }

    /// Returns the cookie signing key.
    pub fn cookie_key(&self) -> &Key {
        &self.cookie_key
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
