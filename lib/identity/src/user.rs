//! User domain type.
//!
//! A User is the local record bound to an identity at an external OAuth2
//! provider. Users are keyed by `(provider, provider_id)` and carry an
//! internal `UserId` that is used as the session principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signin_core::UserId;

use crate::profile::ProviderProfile;

/// A local user record bound to a provider identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Internal user ID.
    id: UserId,
    /// Name of the identity provider (e.g., "google").
    provider: String,
    /// Identifier assigned by the provider; unique per provider.
    provider_id: String,
    /// Display name reported by the provider at first login.
    display_name: Option<String>,
    /// When the user record was created.
    created_at: DateTime<Utc>,
    /// When the user record was last updated.
    updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user for the given provider identity.
    ///
    /// The user ID is generated automatically.
    #[must_use]
    pub fn new(provider: String, provider_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            provider,
            provider_id,
            display_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a new user from a provider profile.
    #[must_use]
    pub fn from_profile(profile: &ProviderProfile) -> Self {
        let mut user = Self::new(profile.provider.clone(), profile.provider_id.clone());
        user.display_name = profile.display_name.clone();
        user
    }

    /// Creates a user with all fields specified.
    ///
    /// Use this when reconstituting a user from storage.
    #[must_use]
    pub fn with_all_fields(
        id: UserId,
        provider: String,
        provider_id: String,
        display_name: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            provider,
            provider_id,
            display_name,
            created_at,
            updated_at,
        }
    }

    /// Returns the user's internal ID.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the identity provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the provider-assigned identifier.
    #[must_use]
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Returns the user's display name, if available.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns when the user was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the user was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
