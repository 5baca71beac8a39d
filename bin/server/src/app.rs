//! HTTP router for the signin server.

use axum::{Json, Router, routing::get};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState, OptionalAuth, RequireAuth};

/// Public view of the signed-in user.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub provider: String,
    pub display_name: Option<String>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let callback_path = state.callback_path.clone();

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/me", get(me))
        .route("/auth/google", get(auth::login))
        .route(&callback_path, get(auth::callback))
        .route("/auth/logout", get(auth::logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(OptionalAuth(current): OptionalAuth) -> String {
    match current {
        Some(current) => format!(
            "Signed in as {} ({}). Visit /auth/logout to sign out.\n",
            current.user.display_name().unwrap_or("unnamed user"),
            current.user.id()
        ),
        None => "Not signed in. Visit /auth/google to sign in.\n".to_string(),
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn me(RequireAuth(current): RequireAuth) -> Json<UserInfo> {
    Json(UserInfo {
        id: current.user.id().to_string(),
        provider: current.user.provider().to_string(),
        display_name: current.user.display_name().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::GoogleStrategy;
    use crate::auth::google::GoogleAuthState;
    use crate::auth::cookie::{self, AUTH_STATE_COOKIE, SESSION_COOKIE};
    use crate::config::{GoogleOAuthConfig, SessionConfig};
    use axum::Form;
    use axum::body::{Body, to_bytes};
    use axum::http::{HeaderMap, Request, StatusCode, header};
    use axum::response::IntoResponse;
    use axum_extra::extract::cookie::{Cookie, Key, SignedCookieJar};
    use signin_core::UserId;
    use signin_identity::{
        InMemoryUserStore, OAuthBinder, ProviderProfile, ProviderTokens, Session, SessionPrincipal,
        User,
    };
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        store: Arc<InMemoryUserStore>,
        binder: Arc<OAuthBinder>,
        key: Key,
    }

    fn test_app() -> TestApp {
        build_app(None)
    }

    fn build_app(google_base: Option<&str>) -> TestApp {
        build_app_with_duration(google_base, 60)
    }

    /// Builds the app, optionally sending Google API calls to `google_base`.
    fn build_app_with_duration(google_base: Option<&str>, duration_minutes: i64) -> TestApp {
        let store = Arc::new(InMemoryUserStore::new());
        let binder = Arc::new(OAuthBinder::new(store.clone()));
        let google_config = GoogleOAuthConfig {
            client_id: "client-123.apps.googleusercontent.com".to_string(),
            client_secret: "GOCSPX-test".to_string(),
            callback_path: "/auth/google/redirect".to_string(),
        };
        let mut google = GoogleStrategy::new(
            &google_config,
            "http://localhost:3000/auth/google/redirect".to_string(),
            binder.clone(),
        )
        .expect("strategy");
        if let Some(base) = google_base {
            google = google.with_endpoints(&format!("{base}/token"), &format!("{base}/userinfo"));
        }
        let session_config = SessionConfig {
            secret: String::new(),
            duration_minutes,
            secure_cookies: false,
        };
        let key = Key::generate();
        let state = AppState::new(
            binder.clone(),
            Arc::new(google),
            session_config,
            google_config.callback_path.clone(),
            key.clone(),
        );

        TestApp {
            router: router(state),
            store,
            binder,
            key,
        }
    }

    /// Serves stand-ins for Google's token and userinfo endpoints.
    async fn spawn_google_stub() -> String {
        async fn token(
            Form(form): Form<HashMap<String, String>>,
        ) -> Result<Json<serde_json::Value>, StatusCode> {
            let expected = [
                ("grant_type", "authorization_code"),
                ("code", "good-code"),
                ("code_verifier", "verifier"),
            ];
            if !expected
                .iter()
                .all(|(name, value)| form.get(*name).map(String::as_str) == Some(*value))
            {
                return Err(StatusCode::BAD_REQUEST);
            }
            Ok(Json(serde_json::json!({
                "access_token": "ya29.stub",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
        }

        async fn userinfo(headers: HeaderMap) -> Result<Json<serde_json::Value>, StatusCode> {
            let authorization = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            if authorization != Some("Bearer ya29.stub") {
                return Err(StatusCode::UNAUTHORIZED);
            }
            Ok(Json(serde_json::json!({
                "sub": "110169484474386276334",
                "name": "Ada Lovelace",
                "email": "ada@example.com"
            })))
        }

        let stub = Router::new()
            .route("/token", axum::routing::post(token))
            .route("/userinfo", axum::routing::get(userinfo));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move { axum::serve(listener, stub).await });

        format!("http://{addr}")
    }

    /// Runs the callback as Google would after consent.
    async fn complete_sign_in(app: &TestApp, code: &str) -> axum::response::Response {
        let auth_state = GoogleAuthState {
            csrf_token: "expected".to_string(),
            pkce_verifier: "verifier".to_string(),
        };
        let cookie = signed_cookie(
            &app.key,
            AUTH_STATE_COOKIE,
            cookie::encode(&auth_state).expect("encode"),
        );

        get(
            &app.router,
            &format!("/auth/google/redirect?code={code}&state=expected"),
            Some(cookie),
        )
        .await
    }

    fn set_cookies(response: &axum::response::Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().expect("ascii cookie").to_string())
            .collect()
    }

    async fn me_json(app: &TestApp, cookie: String) -> serde_json::Value {
        let response = get(&app.router, "/me", Some(cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    /// Produces a `Cookie` request header value signed with `key`.
    fn signed_cookie(key: &Key, name: &'static str, value: String) -> String {
        let response = SignedCookieJar::new(key.clone())
            .add(Cookie::new(name, value))
            .into_response();
        let set_cookie = response.headers()[header::SET_COOKIE]
            .to_str()
            .expect("ascii cookie");
        set_cookie
            .split(';')
            .next()
            .expect("name=value")
            .to_string()
    }

    fn session_cookie(key: &Key, session: &Session) -> String {
        signed_cookie(key, SESSION_COOKIE, cookie::encode(session).expect("encode"))
    }

    async fn sign_up(binder: &OAuthBinder, name: &str) -> User {
        let profile = ProviderProfile::new("google".to_string(), "1093".to_string())
            .with_display_name(Some(name.to_string()));
        binder
            .verify(&ProviderTokens::new("token".to_string()), &profile)
            .await
            .expect("verify")
            .user
    }

    async fn get(router: &Router, uri: &str, cookie: Option<String>) -> axum::response::Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        router
            .clone()
            .oneshot(request.body(Body::empty()).expect("request"))
            .await
            .expect("infallible")
    }

    fn location(response: &axum::response::Response) -> &str {
        response.headers()[header::LOCATION]
            .to_str()
            .expect("ascii location")
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = test_app();

        let response = get(&app.router, "/health", None).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_redirects_to_google_and_sets_state_cookie() {
        let app = test_app();

        let response = get(&app.router, "/auth/google", None).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("https://accounts.google.com/o/oauth2/v2/auth"));
        assert!(location(&response).contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fgoogle%2Fredirect"
        ));
        let set_cookie = response.headers()[header::SET_COOKIE]
            .to_str()
            .expect("ascii cookie");
        assert!(set_cookie.starts_with(&format!("{AUTH_STATE_COOKIE}=")));
        assert!(set_cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn callback_without_state_cookie_is_rejected() {
        let app = test_app();

        let response = get(&app.router, "/auth/google/redirect?code=abc&state=xyz", None).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn callback_with_mismatched_state_is_rejected() {
        let app = test_app();
        let auth_state = GoogleAuthState {
            csrf_token: "expected".to_string(),
            pkce_verifier: "verifier".to_string(),
        };
        let cookie = signed_cookie(
            &app.key,
            AUTH_STATE_COOKIE,
            cookie::encode(&auth_state).expect("encode"),
        );

        let response = get(
            &app.router,
            "/auth/google/redirect?code=abc&state=forged",
            Some(cookie),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&body[..], b"CSRF token mismatch");
    }

    #[tokio::test]
    async fn callback_signs_in_and_sets_session() {
        let base = spawn_google_stub().await;
        let app = build_app(Some(&base));

        let response = complete_sign_in(&app, "good-code").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        let cookies = set_cookies(&response);
        let session = cookies
            .iter()
            .find(|c| c.starts_with(&format!("{SESSION_COOKIE}=")))
            .expect("session cookie set");
        assert!(session.contains("HttpOnly"));
        assert!(
            cookies
                .iter()
                .any(|c| c.starts_with(&format!("{AUTH_STATE_COOKIE}=")) && c.contains("Max-Age=0"))
        );

        let session_pair = session.split(';').next().expect("name=value").to_string();
        let json = me_json(&app, session_pair).await;
        assert_eq!(json["provider"], "google");
        assert_eq!(json["display_name"], "Ada Lovelace");
        assert_eq!(app.store.len().await, 1);
    }

    #[tokio::test]
    async fn repeated_sign_in_reuses_user() {
        let base = spawn_google_stub().await;
        let app = build_app(Some(&base));

        let mut ids = Vec::new();
        for _ in 0..2 {
            let response = complete_sign_in(&app, "good-code").await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            let session = set_cookies(&response)
                .into_iter()
                .find(|c| c.starts_with(&format!("{SESSION_COOKIE}=")))
                .expect("session cookie set");
            let session_pair = session.split(';').next().expect("name=value").to_string();
            ids.push(me_json(&app, session_pair).await["id"].clone());
        }

        assert_eq!(ids[0], ids[1]);
        assert_eq!(app.store.len().await, 1);
    }

    #[tokio::test]
    async fn rejected_code_fails_sign_in() {
        let base = spawn_google_stub().await;
        let app = build_app(Some(&base));

        let response = complete_sign_in(&app, "stale-code").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(set_cookies(&response).is_empty());
        assert!(app.store.is_empty().await);
    }

    #[tokio::test]
    async fn out_of_range_session_duration_fails_before_binding() {
        let base = spawn_google_stub().await;
        let app = build_app_with_duration(Some(&base), i64::MAX);

        let response = complete_sign_in(&app, "good-code").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(set_cookies(&response).is_empty());
        assert!(app.store.is_empty().await);
    }

    #[tokio::test]
    async fn callback_with_provider_error_is_unauthorized() {
        let app = test_app();

        let response = get(
            &app.router,
            "/auth/google/redirect?error=access_denied&state=xyz",
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn callback_without_code_is_rejected() {
        let app = test_app();

        let response = get(&app.router, "/auth/google/redirect", None).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_without_session_redirects_to_login() {
        let app = test_app();

        let response = get(&app.router, "/me", None).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/auth/google");
    }

    #[tokio::test]
    async fn me_with_valid_session_returns_user() {
        let app = test_app();
        let user = sign_up(&app.binder, "Ada Lovelace").await;
        let session = Session::new(
            app.binder.serialize_user(&user),
            chrono::Duration::minutes(5),
        );

        let response = get(&app.router, "/me", Some(session_cookie(&app.key, &session))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["id"], user.id().to_string());
        assert_eq!(json["provider"], "google");
        assert_eq!(json["display_name"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn expired_session_is_unauthenticated() {
        let app = test_app();
        let user = sign_up(&app.binder, "Ada").await;
        let session = Session::new(
            app.binder.serialize_user(&user),
            chrono::Duration::seconds(-1),
        );

        let response = get(&app.router, "/me", Some(session_cookie(&app.key, &session))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn session_for_unknown_user_is_unauthenticated() {
        let app = test_app();
        let session = Session::new(
            SessionPrincipal::new(UserId::new()),
            chrono::Duration::minutes(5),
        );

        let response = get(&app.router, "/me", Some(session_cookie(&app.key, &session))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn session_signed_with_another_key_is_ignored() {
        let app = test_app();
        let user = sign_up(&app.binder, "Ada").await;
        let session = Session::new(
            app.binder.serialize_user(&user),
            chrono::Duration::minutes(5),
        );

        let forged = session_cookie(&Key::generate(), &session);
        let response = get(&app.router, "/me", Some(forged)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn index_greets_signed_in_user() {
        let app = test_app();
        let user = sign_up(&app.binder, "Ada").await;
        let session = Session::new(
            app.binder.serialize_user(&user),
            chrono::Duration::minutes(5),
        );

        let response = get(&app.router, "/", Some(session_cookie(&app.key, &session))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let text = String::from_utf8(body.to_vec()).expect("utf8");
        assert!(text.starts_with("Signed in as Ada"));
    }

    #[tokio::test]
    async fn logout_clears_session_cookie() {
        let app = test_app();

        let response = get(&app.router, "/auth/logout", None).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let set_cookie = response.headers()[header::SET_COOKIE]
            .to_str()
            .expect("ascii cookie");
        assert!(set_cookie.starts_with(&format!("{SESSION_COOKIE}=")));
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
