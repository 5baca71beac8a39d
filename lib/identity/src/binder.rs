//! Binding of provider identities to local users.
//!
//! The `OAuthBinder` is the piece an OAuth2 strategy calls once the provider
//! handshake has succeeded. It resolves the provider profile to a local
//! `User` (find-or-create) and provides the two session hooks that map a
//! user to and from the `SessionPrincipal` kept in the session.

use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{BindError, StoreError};
use crate::profile::{ProviderProfile, ProviderTokens};
use crate::session::SessionPrincipal;
use crate::store::UserStore;
use crate::user::User;

/// Result of a successful bind.
#[derive(Debug, Clone)]
pub struct BindOutcome {
    /// The resolved local user.
    pub user: User,
    /// Whether the user was created by this call (first login).
    pub created: bool,
}

/// Resolves provider identities to local users.
#[derive(Clone)]
pub struct OAuthBinder {
    store: Arc<dyn UserStore>,
}

impl OAuthBinder {
    /// Creates a binder backed by the given user store.
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Finds or creates the local user for a verified provider profile.
    ///
    /// The tokens are accepted as issued; validating them is the strategy's
    /// concern. Repeated calls for the same provider identity return the same
    /// user and create nothing new.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::InvalidProfile`] if the profile carries no
    /// provider id, and [`BindError::Persistence`] if the store fails during
    /// lookup or creation.
    #[instrument(
        skip(self, tokens, profile),
        fields(provider = %profile.provider, provider_id = %profile.provider_id)
    )]
    pub async fn verify(
        &self,
        tokens: &ProviderTokens,
        profile: &ProviderProfile,
    ) -> Result<BindOutcome, Report<BindError>> {
        if profile.provider_id.trim().is_empty() {
            return Err(BindError::InvalidProfile {
                reason: "profile has no provider id".to_string(),
            }
            .into());
        }
        debug!(has_refresh_token = tokens.refresh_token.is_some(), "binding provider identity");

        if let Some(user) = self.lookup(profile).await? {
            debug!(user_id = %user.id(), "found existing user");
            return Ok(BindOutcome {
                user,
                created: false,
            });
        }

        let user = User::from_profile(profile);
        match self.store.create(&user).await {
            Ok(()) => {
                info!(user_id = %user.id(), "created user on first login");
                Ok(BindOutcome {
                    user,
                    created: true,
                })
            }
            Err(e) if matches!(e.current_context(), StoreError::Conflict { .. }) => {
                // A concurrent first login won; the store already holds the record.
                warn!("user created concurrently, reloading");
                match self.lookup(profile).await? {
                    Some(user) => Ok(BindOutcome {
                        user,
                        created: false,
                    }),
                    None => {
                        error!(error = %e, "conflicting user vanished before reload");
                        Err(e.context(BindError::Persistence {
                            operation: "user creation",
                        }))
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "failed to create user");
                Err(e.context(BindError::Persistence {
                    operation: "user creation",
                }))
            }
        }
    }

    /// Maps a user to the principal stored in the session.
    #[must_use]
    pub fn serialize_user(&self, user: &User) -> SessionPrincipal {
        SessionPrincipal::new(user.id())
    }

    /// Maps a session principal back to a user.
    ///
    /// A principal whose user no longer exists yields `Ok(None)`; callers
    /// must treat that as unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Persistence`] if the lookup fails.
    #[instrument(skip(self, principal), fields(principal = %principal))]
    pub async fn deserialize_user(
        &self,
        principal: &SessionPrincipal,
    ) -> Result<Option<User>, Report<BindError>> {
        let user = self
            .store
            .find_by_id(principal.user_id())
            .await
            .map_err(|e| {
                error!(error = %e, "failed to load session user");
                e.context(BindError::Persistence {
                    operation: "session user lookup",
                })
            })?;

        if user.is_none() {
            debug!("session principal has no matching user");
        }
        Ok(user)
    }

    async fn lookup(&self, profile: &ProviderProfile) -> Result<Option<User>, Report<BindError>> {
        self.store
            .find_by_provider_id(&profile.provider, &profile.provider_id)
            .await
            .map_err(|e| {
                error!(error = %e, "user lookup failed");
                e.context(BindError::Persistence {
                    operation: "user lookup",
                })
            })
    }
}
