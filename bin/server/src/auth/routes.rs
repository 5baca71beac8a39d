//! Authentication routes for login, callback, and logout.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use rootcause::prelude::Report;
use serde::Deserialize;
use signin_identity::Session;
use time::Duration as TimeDuration;

use super::{
    AppState,
    cookie::{self, AUTH_STATE_COOKIE, AUTH_STATE_MAX_AGE, SESSION_COOKIE},
    google::{GoogleAuthState, GoogleOAuthError},
    middleware::OptionalAuth,
};

/// Query parameters Google appends to the callback URL.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Initiates the Google login flow by redirecting to the consent screen.
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let (auth_url, auth_state) = state.google.authorization_url();

    // Keep the CSRF token and PKCE verifier until Google calls back
    let value = cookie::encode(&auth_state).map_err(|e| AuthError::Internal(e.to_string()))?;
    let auth_cookie = cookie::build(
        AUTH_STATE_COOKIE,
        value,
        AUTH_STATE_MAX_AGE,
        state.session_config.secure_cookies,
    );

    Ok((jar.add(auth_cookie), Redirect::to(&auth_url)))
}

/// Handles the redirect back from Google after the user signs in.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: SignedCookieJar,
) -> Result<impl IntoResponse, AuthError> {
    if let Some(error) = query.error {
        return Err(AuthError::ProviderDenied(error));
    }
    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        return Err(AuthError::InvalidCallback);
    };

    // Retrieve and validate auth state from cookie
    let auth_state_cookie = jar
        .get(AUTH_STATE_COOKIE)
        .ok_or(AuthError::MissingAuthState)?;
    let auth_state: GoogleAuthState =
        cookie::decode(auth_state_cookie.value()).ok_or(AuthError::InvalidAuthState)?;

    if returned_state != auth_state.csrf_token {
        return Err(AuthError::CsrfMismatch);
    }

    let duration = state
        .session_config
        .duration()
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let outcome = state
        .google
        .authenticate(&code, &auth_state.pkce_verifier)
        .await
        .map_err(AuthError::Authentication)?;

    let principal = state.binder.serialize_user(&outcome.user);
    let session = Session::new(principal, duration);
    let value = cookie::encode(&session).map_err(|e| AuthError::Internal(e.to_string()))?;

    tracing::info!(
        user_id = %outcome.user.id(),
        first_login = outcome.created,
        "user signed in"
    );

    let session_cookie = cookie::build(
        SESSION_COOKIE,
        value,
        TimeDuration::seconds(duration.num_seconds()),
        state.session_config.secure_cookies,
    );
    let jar = jar
        .add(session_cookie)
        .add(cookie::removal(AUTH_STATE_COOKIE));

    Ok((jar, Redirect::to("/")))
}

/// Logs out the user by discarding their session cookie.
pub async fn logout(
    OptionalAuth(current): OptionalAuth,
    jar: SignedCookieJar,
) -> impl IntoResponse {
    if let Some(current) = current {
        tracing::info!(user_id = %current.user.id(), "user signed out");
    }

    (jar.add(cookie::removal(SESSION_COOKIE)), Redirect::to("/"))
}

/// Authentication errors.
#[derive(Debug)]
pub enum AuthError {
    MissingAuthState,
    InvalidAuthState,
    InvalidCallback,
    CsrfMismatch,
    ProviderDenied(String),
    Authentication(Report<GoogleOAuthError>),
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingAuthState => (StatusCode::BAD_REQUEST, "Missing auth state"),
            Self::InvalidAuthState => (StatusCode::BAD_REQUEST, "Invalid auth state"),
            Self::InvalidCallback => (StatusCode::BAD_REQUEST, "Invalid callback request"),
            Self::CsrfMismatch => (StatusCode::BAD_REQUEST, "CSRF token mismatch"),
            Self::ProviderDenied(reason) => {
                tracing::warn!(%reason, "Google sign-in was not completed");
                (StatusCode::UNAUTHORIZED, "Sign-in was cancelled or denied")
            }
            Self::Authentication(report) => {
                tracing::error!(error = %report, "Google sign-in failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
            }
            Self::Internal(msg) => {
                tracing::error!("Internal auth error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}
