//! Google OAuth2 sign-in strategy.
//!
//! The strategy drives the OAuth2 authorization-code flow against Google and
//! hands the resulting tokens and profile to the [`OAuthBinder`]:
//! - [`GoogleStrategy::authorization_url`] builds the redirect to Google
//! - [`GoogleStrategy::authenticate`] exchanges the returned code, fetches
//!   the user's profile, and binds it to a local user
//!
//! The strategy is constructed once at startup and injected into the router
//! state.

use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
    basic::{BasicClient, BasicTokenResponse},
};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use signin_identity::{BindOutcome, OAuthBinder, ProviderProfile, ProviderTokens};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

use crate::config::GoogleOAuthConfig;

/// Provider name recorded on users created through this strategy.
pub const PROVIDER: &str = "google";

/// Google OAuth authorization URL.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth token URL.
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google OpenID Connect userinfo endpoint.
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Scopes needed to read the user's id, name, and email.
const GOOGLE_SCOPES: &[&str] = &["openid", "email", "profile"];

/// Google sign-in strategy.
pub struct GoogleStrategy {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    userinfo_url: String,
    http_client: reqwest::Client,
    binder: Arc<OAuthBinder>,
}

/// State that must survive the round trip through Google.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleAuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
}

/// Profile fields returned by the userinfo endpoint.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    name: Option<String>,
    email: Option<String>,
}

impl GoogleUserInfo {
    fn into_profile(self) -> ProviderProfile {
        ProviderProfile::new(PROVIDER.to_string(), self.sub)
            .with_display_name(self.name)
            .with_email(self.email)
    }
}

impl GoogleStrategy {
    /// Creates the strategy.
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(
        config: &GoogleOAuthConfig,
        redirect_url: String,
        binder: Arc<OAuthBinder>,
    ) -> Result<Self, GoogleOAuthError> {
        let redirect_url = RedirectUrl::new(redirect_url)
            .map_err(|e| GoogleOAuthError::Configuration(format!("invalid redirect URL: {e}")))?;
        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
            .map_err(|e| GoogleOAuthError::Configuration(format!("invalid auth URL: {e}")))?;
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
            .map_err(|e| GoogleOAuthError::Configuration(format!("invalid token URL: {e}")))?;

        // Redirects must not be followed during the token exchange.
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| GoogleOAuthError::Configuration(format!("HTTP client error: {e}")))?;

        Ok(Self {
            client_id: ClientId::new(config.client_id.clone()),
            client_secret: ClientSecret::new(config.client_secret.clone()),
            auth_url,
            token_url,
            redirect_url,
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            http_client,
            binder,
        })
    }

    /// Returns the redirect URI registered with Google.
    #[must_use]
    pub fn redirect_url(&self) -> &str {
        self.redirect_url.as_str()
    }

    /// Sends token and userinfo requests to other endpoints.
    #[cfg(test)]
    pub(crate) fn with_endpoints(mut self, token_url: &str, userinfo_url: &str) -> Self {
        self.token_url = TokenUrl::new(token_url.to_string()).expect("valid token URL");
        self.userinfo_url = userinfo_url.to_string();
        self
    }

    /// Generates the authorization URL to send the user to.
    ///
    /// Returns the URL along with the state to keep until the callback.
    pub fn authorization_url(&self) -> (String, GoogleAuthState) {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);

        for scope in GOOGLE_SCOPES {
            auth_request = auth_request.add_scope(Scope::new((*scope).to_string()));
        }

        let (auth_url, csrf_token) = auth_request.url();

        let state = GoogleAuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        };

        (auth_url.to_string(), state)
    }

    /// Exchanges the authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<ProviderTokens, GoogleOAuthError> {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let token_result: BasicTokenResponse = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| GoogleOAuthError::TokenExchange(format!("token exchange failed: {e}")))?;

        Ok(
            ProviderTokens::new(token_result.access_token().secret().clone())
                .with_refresh_token(token_result.refresh_token().map(|t| t.secret().clone()))
                .with_expires_in_seconds(token_result.expires_in().map(|d| d.as_secs())),
        )
    }

    /// Fetches the signed-in user's profile.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, GoogleOAuthError> {
        let info: GoogleUserInfo = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GoogleOAuthError::Profile(format!("userinfo request failed: {e}")))?
            .error_for_status()
            .map_err(|e| GoogleOAuthError::Profile(format!("userinfo rejected: {e}")))?
            .json()
            .await
            .map_err(|e| GoogleOAuthError::Profile(format!("invalid userinfo body: {e}")))?;

        Ok(info.into_profile())
    }

    /// Completes sign-in: exchanges the code, reads the profile, and binds it
    /// to a local user.
    ///
    /// # Errors
    ///
    /// Returns [`GoogleOAuthError::Binding`] wrapping the binder's report if
    /// the local user cannot be resolved.
    #[instrument(skip_all)]
    pub async fn authenticate(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<BindOutcome, Report<GoogleOAuthError>> {
        let tokens = self.exchange_code(code, pkce_verifier).await?;
        let profile = self.fetch_profile(&tokens.access_token).await?;

        self.binder
            .verify(&tokens, &profile)
            .await
            .map_err(|e| e.context(GoogleOAuthError::Binding))
    }
}

/// Google sign-in errors.
#[derive(Debug)]
pub enum GoogleOAuthError {
    /// Configuration error.
    Configuration(String),
    /// Token exchange failed.
    TokenExchange(String),
    /// Fetching the user's profile failed.
    Profile(String),
    /// The profile could not be bound to a local user.
    Binding,
}

impl fmt::Display for GoogleOAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "Google OAuth configuration error: {msg}"),
            Self::TokenExchange(msg) => write!(f, "Google token exchange error: {msg}"),
            Self::Profile(msg) => write!(f, "Google profile error: {msg}"),
            Self::Binding => write!(f, "failed to bind Google account to a local user"),
        }
    }
}

impl std::error::Error for GoogleOAuthError {}
