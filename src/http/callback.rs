//! OAuth callback and sign-out
//!
//! The browser lands on `/auth/callback` after the provider round trip. We
//! trade the authorization code for a session and keep the tokens in
//! HttpOnly cookies, which `require_auth` accepts in place of a bearer header.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::app::AppState;
use crate::http::middleware::ACCESS_TOKEN_COOKIE;

pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";
pub const CODE_VERIFIER_COOKIE: &str = "sb-code-verifier";
pub const AUTH_ERROR_PATH: &str = "/auth/auth-code-error";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    next: Option<String>,
}

/// Only same-site absolute paths are followed; anything else goes home.
///
/// Control characters are refused outright: they cannot go into a
/// `Location` header, and browsers strip tabs and newlines from URLs, which
/// turns `/\t/host` into `//host`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn expired(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

pub async fn oauth_callback_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Redirect) {
    let next = safe_next(params.next.as_deref()).to_string();

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        warn!("OAuth callback without a code");
        return (jar, Redirect::to(AUTH_ERROR_PATH));
    };

    let Some(verifier) = jar
        .get(CODE_VERIFIER_COOKIE)
        .map(|c| c.value().to_string())
    else {
        warn!("OAuth callback without a PKCE verifier cookie");
        return (jar, Redirect::to(AUTH_ERROR_PATH));
    };

    match state.supabase.exchange_code_for_session(&code, &verifier).await {
        Ok(session) => {
            let secure = state.config.secure_cookies();
            let jar = jar
                .remove(expired(CODE_VERIFIER_COOKIE))
                .add(session_cookie(ACCESS_TOKEN_COOKIE, session.access_token, secure))
                .add(session_cookie(REFRESH_TOKEN_COOKIE, session.refresh_token, secure));
            info!(next = %next, "OAuth session established");
            (jar, Redirect::to(&next))
        }
        Err(e) => {
            error!(error = %e, "Failed to exchange OAuth code");
            (jar, Redirect::to(AUTH_ERROR_PATH))
        }
    }
}

pub async fn signout_handler(jar: CookieJar) -> impl IntoResponse {
    let jar = jar
        .remove(expired(ACCESS_TOKEN_COOKIE))
        .remove(expired(REFRESH_TOKEN_COOKIE));
    (jar, StatusCode::NO_CONTENT)
}
