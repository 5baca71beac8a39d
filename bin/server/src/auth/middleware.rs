//! Authentication extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use signin_identity::{Session, User};

use super::{
    AppState,
    cookie::{self, SESSION_COOKIE},
};

/// The signed-in user for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The user record, loaded fresh for this request.
    pub user: User,
    /// The session the user was resolved from.
    pub session: Session,
}

/// Extractor for requiring an authenticated user.
///
/// If the user is not authenticated, they will be redirected to the login page.
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = SignedCookieJar::from_headers(&parts.headers, app_state.cookie_key().clone());

        // Unsigned, tampered, or malformed cookies all read as absent
        let session: Session = jar
            .get(SESSION_COOKIE)
            .and_then(|c| cookie::decode(c.value()))
            .ok_or(AuthRejection::NotAuthenticated)?;

        if session.is_expired() {
            return Err(AuthRejection::SessionExpired);
        }

        let user = app_state
            .binder
            .deserialize_user(&session.principal())
            .await
            .map_err(|_| AuthRejection::InternalError)?
            .ok_or(AuthRejection::NotAuthenticated)?;

        Ok(RequireAuth(CurrentUser { user, session }))
    }
}

/// Extractor for optionally getting the authenticated user.
///
/// Returns None if the user is not authenticated. Persistence failures are
/// still rejected.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match RequireAuth::from_request_parts(parts, state).await {
            Ok(RequireAuth(user)) => Ok(OptionalAuth(Some(user))),
            Err(AuthRejection::InternalError) => Err(AuthRejection::InternalError),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
    SessionExpired,
    InternalError,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated | Self::SessionExpired => {
                Redirect::to("/auth/google").into_response()
            }
            Self::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
