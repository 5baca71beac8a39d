//! Centralized server configuration.
//!
//! Configuration is loaded via the `config` crate from environment variables
//! prefixed with `SIGNIN`, using `__` to separate nested keys
//! (e.g. `SIGNIN__GOOGLE__CLIENT_ID`). A `.env` file in the working
//! directory is read first, if present.

use axum_extra::extract::cookie::Key;
use base64::Engine;
use serde::Deserialize;
use std::fmt;

/// Environment variable prefix for all settings.
const ENV_PREFIX: &str = "SIGNIN";

/// Longest accepted session, in minutes (one year).
pub const MAX_SESSION_DURATION_MINUTES: i64 = 365 * 24 * 60;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Externally visible base URL, used to build the OAuth redirect URI.
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// PostgreSQL connection URL. Users are kept in memory when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Session configuration.
    pub session: SessionConfig,

    /// Google OAuth2 client configuration.
    pub google: GoogleOAuthConfig,
}

/// Session-related configuration.
#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    /// Base64-encoded cookie signing secret (at least 64 bytes once decoded).
    pub secret: String,

    /// Session duration in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

/// Google OAuth2 client configuration.
#[derive(Clone, Deserialize)]
pub struct GoogleOAuthConfig {
    /// OAuth2 client ID issued by Google.
    pub client_id: String,

    /// OAuth2 client secret issued by Google.
    pub client_secret: String,

    /// Path Google redirects back to after the user signs in.
    #[serde(default = "default_callback_path")]
    pub callback_path: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_session_duration_minutes() -> i64 {
    24 * 60
}

fn default_secure_cookies() -> bool {
    true
}

fn default_callback_path() -> String {
    "/auth/google/redirect".to_string()
}

/// Configuration values that deserialize but cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValueError {
    /// The session secret is not valid base64 or is too short.
    InvalidSessionSecret { reason: String },
    /// The callback path is not an absolute path.
    InvalidCallbackPath { path: String },
    /// The session duration is not positive or exceeds one year.
    InvalidSessionDuration { minutes: i64 },
}

impl fmt::Display for ConfigValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSessionSecret { reason } => {
                write!(f, "invalid session secret: {reason}")
            }
            Self::InvalidCallbackPath { path } => {
                write!(f, "callback path must start with '/': {path}")
            }
            Self::InvalidSessionDuration { minutes } => {
                write!(
                    f,
                    "session duration must be between 1 and {MAX_SESSION_DURATION_MINUTES} minutes, got {minutes}"
                )
            }
        }
    }
}

impl std::error::Error for ConfigValueError {}

impl ServerConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // A missing .env file is not an error.
        dotenvy::dotenv().ok();
        Self::load(environment())
    }

    fn load(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// Checks values that deserialize fine but are unusable.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigValueError> {
        if !self.google.callback_path.starts_with('/') {
            return Err(ConfigValueError::InvalidCallbackPath {
                path: self.google.callback_path.clone(),
            });
        }
        self.session.duration()?;
        self.session.signing_key().map(|_| ())
    }

    /// Returns the absolute OAuth redirect URI.
    #[must_use]
    pub fn redirect_url(&self) -> String {
        format!(
            "{}{}",
            self.public_url.trim_end_matches('/'),
            self.google.callback_path
        )
    }
}

impl SessionConfig {
    /// Returns the session lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured minutes are not positive or exceed
    /// [`MAX_SESSION_DURATION_MINUTES`].
    pub fn duration(&self) -> Result<chrono::Duration, ConfigValueError> {
        let minutes = self.duration_minutes;
        if !(1..=MAX_SESSION_DURATION_MINUTES).contains(&minutes) {
            return Err(ConfigValueError::InvalidSessionDuration { minutes });
        }
        chrono::Duration::try_minutes(minutes)
            .ok_or(ConfigValueError::InvalidSessionDuration { minutes })
    }

    /// Derives the cookie signing key from the configured secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is not base64 or decodes to fewer than
    /// 64 bytes.
    pub fn signing_key(&self) -> Result<Key, ConfigValueError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.secret.trim())
            .map_err(|e| ConfigValueError::InvalidSessionSecret {
                reason: e.to_string(),
            })?;
        Key::try_from(bytes.as_slice()).map_err(|e| ConfigValueError::InvalidSessionSecret {
            reason: e.to_string(),
        })
    }
}

// Keep secrets out of logs.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("duration_minutes", &self.duration_minutes)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

impl fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("callback_path", &self.callback_path)
            .finish()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
