//! Data handed to the binder by an OAuth2 strategy after a successful handshake.

use std::fmt;

/// Identity information reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Name of the identity provider (e.g., "google").
    pub provider: String,
    /// The provider-assigned user identifier (e.g., the Google `sub`).
    pub provider_id: String,
    /// Display name, if the provider shared one.
    pub display_name: Option<String>,
    /// Email address, if the provider shared one.
    pub email: Option<String>,
}

impl ProviderProfile {
    /// Creates a profile carrying only the provider identity.
    #[must_use]
    pub fn new(provider: String, provider_id: String) -> Self {
        Self {
            provider,
            provider_id,
            display_name: None,
            email: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name;
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }
}

/// Tokens issued by the provider during the handshake.
///
/// The binder receives these but does not validate them.
#[derive(Clone)]
pub struct ProviderTokens {
    /// Access token for the provider's APIs.
    pub access_token: String,
    /// Refresh token, when the provider issued one.
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds, if reported.
    pub expires_in_seconds: Option<u64>,
}

impl ProviderTokens {
    /// Creates tokens holding only an access token.
    #[must_use]
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            refresh_token: None,
            expires_in_seconds: None,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    /// Sets the access token lifetime.
    #[must_use]
    pub fn with_expires_in_seconds(mut self, seconds: Option<u64>) -> Self {
        self.expires_in_seconds = seconds;
        self
    }
}

// Keep secrets out of logs.
impl fmt::Debug for ProviderTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderTokens")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_in_seconds", &self.expires_in_seconds)
            .finish()
    }
}
