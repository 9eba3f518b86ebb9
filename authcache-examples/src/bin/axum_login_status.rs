//! # Axum Login Status Example
//!
//! Shows how an HTTP layer drives the session lifecycle during an OAuth login:
//!
//! - `GET /login` starts a session and stores the token in a cookie before the
//!   redirect to the provider.
//! - `GET /callback?code=...` stands in for the provider callback. The code check is a
//!   placeholder for a real code exchange.
//! - `GET /protected` is only served to authenticated sessions.
//! - `GET /logout` removes the session.
//!
//! The store address comes from `REDIS_ADDR` (default `localhost:6379`). If Redis is not
//! reachable the server still starts, and login attempts answer `503`.

use authcache::flow::{SessionLifecycle, StatusCache};
use authcache::session::{CacheConfig, RedisStatusCache};
use authcache::{AuthError, SessionToken};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_cookies::{Cookie, CookieManagerLayer, Cookies};

const SESSION_COOKIE: &str = "authcache_session";

#[derive(Clone)]
struct AppState {
    lifecycle: SessionLifecycle,
}

/// Maps lifecycle errors onto HTTP responses.
struct AppError(AuthError);

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            e if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::SessionNotFound
            | AuthError::NotAuthenticated(_)
            | AuthError::MalformedToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidTransition { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return (
                status,
                "Login is temporarily unavailable, please try again",
            )
                .into_response();
        }
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Session cache error");
        }
        (status, self.0.to_string()).into_response()
    }
}

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

fn session_token(cookies: &Cookies) -> Result<SessionToken, AuthError> {
    let cookie = cookies.get(SESSION_COOKIE).ok_or(AuthError::SessionNotFound)?;
    SessionToken::parse(cookie.value())
}

async fn index() -> impl IntoResponse {
    Html("<h1>authcache</h1><p><a href=\"/login\">Login</a></p>")
}

async fn login(State(state): State<AppState>, cookies: Cookies) -> Result<Redirect, AppError> {
    let token = state.lifecycle.start().await?;
    let cookie = Cookie::build((SESSION_COOKIE, token.into_inner()))
        .http_only(true)
        .path("/")
        .build();
    cookies.add(cookie);
    // A real deployment redirects to the provider's authorization URL here.
    Ok(Redirect::to("/callback?code=demo"))
}

async fn callback(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, AppError> {
    let token = session_token(&cookies)?;
    let verified = params.error.is_none() && params.code.is_some_and(|c| !c.is_empty());
    state.lifecycle.record_outcome(&token, verified).await?;
    Ok(Redirect::to("/protected"))
}

async fn protected(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Html<&'static str>, AppError> {
    let token = session_token(&cookies)?;
    state.lifecycle.require_authenticated(&token).await?;
    Ok(Html("<h1>Protected Area</h1><a href=\"/logout\">Logout</a>"))
}

async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<Redirect, AppError> {
    if let Ok(token) = session_token(&cookies) {
        state.lifecycle.logout(&token).await?;
    }
    cookies.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    Ok(Redirect::to("/"))
}

async fn ready(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.lifecycle.cache().ping().await?;
    Ok("ok")
}

fn app(lifecycle: SessionLifecycle) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/protected", get(protected))
        .route("/logout", get(logout))
        .route("/ready", get(ready))
        .layer(CookieManagerLayer::new())
        .with_state(AppState { lifecycle })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,authcache_flow=debug,authcache_session=debug",
                )
            }),
        )
        .init();

    let config = CacheConfig::from_env();
    let cache: Arc<dyn StatusCache> =
        Arc::new(RedisStatusCache::connect_or_unavailable(&config).await);
    let lifecycle = SessionLifecycle::builder()
        .cache(cache)
        .config(&config)
        .build();

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("Listening on http://localhost:3000");
    axum::serve(listener, app(lifecycle)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use authcache::session::MemoryStatusCache;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    fn setup_app() -> (Router, MemoryStatusCache) {
        let cache = MemoryStatusCache::new();
        let lifecycle = SessionLifecycle::new(Arc::new(cache.clone()));
        (app(lifecycle), cache)
    }

    fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    /// Returns `name=value` from the first Set-Cookie header.
    fn session_cookie(response: &Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login sets a cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_login_callback_protected_logout() {
        let (app, _) = setup_app();

        let response = app.clone().oneshot(get_request("/login", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = session_cookie(&response);

        let response = app
            .clone()
            .oneshot(get_request("/protected", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(get_request("/callback?code=abc", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(get_request("/protected", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        app.clone()
            .oneshot(get_request("/logout", Some(&cookie)))
            .await
            .unwrap();
        let response = app
            .oneshot(get_request("/protected", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_denied_callback_stays_unauthorized() {
        let (app, _) = setup_app();
        let response = app.clone().oneshot(get_request("/login", None)).await.unwrap();
        let cookie = session_cookie(&response);

        app.clone()
            .oneshot(get_request("/callback?error=access_denied", Some(&cookie)))
            .await
            .unwrap();
        let response = app
            .oneshot(get_request("/protected", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_late_denial_keeps_session_authenticated() {
        let (app, _) = setup_app();
        let response = app.clone().oneshot(get_request("/login", None)).await.unwrap();
        let cookie = session_cookie(&response);

        app.clone()
            .oneshot(get_request("/callback?code=abc", Some(&cookie)))
            .await
            .unwrap();
        let response = app
            .clone()
            .oneshot(get_request("/callback?error=access_denied", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .oneshot(get_request("/protected", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_with_cache_down_returns_service_unavailable() {
        let (app, cache) = setup_app();
        cache.set_available(false);

        let response = app.clone().oneshot(get_request("/login", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let response = app.oneshot(get_request("/ready", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_garbage_cookie_is_rejected() {
        let (app, _) = setup_app();
        let response = app
            .oneshot(get_request("/protected", Some("authcache_session=../../etc")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
