//! # Session
//!
//! The browser carries a signed token in an HttpOnly cookie. These extractors
//! turn it back into an [`Identity`] for the handlers.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts, OriginalUri};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use domains::Identity;

use crate::state::{AppState, WebSettings};

pub const SESSION_COOKIE: &str = "rb_session";
pub const FLASH_COOKIE: &str = "rb_flash";

/// Reads one cookie from the request headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse_encoded)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
}

fn header(cookie: Cookie<'_>) -> Option<HeaderValue> {
    match HeaderValue::from_str(&cookie.encoded().to_string()) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!(error = %err, "cookie is not a valid header value");
            None
        }
    }
}

fn base_cookie(name: &'static str, value: String, web: &WebSettings) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(web.cookie_secure)
        .build()
}

pub fn session_cookie(token: String, web: &WebSettings) -> Option<HeaderValue> {
    let mut cookie = base_cookie(SESSION_COOKIE, token, web);
    cookie.set_max_age(Duration::hours(web.session_ttl_hours));
    header(cookie)
}

fn expired(name: &'static str, web: &WebSettings) -> Option<HeaderValue> {
    let mut cookie = base_cookie(name, String::new(), web);
    cookie.set_max_age(Duration::ZERO);
    header(cookie)
}

pub fn clear_session(web: &WebSettings) -> Option<HeaderValue> {
    expired(SESSION_COOKIE, web)
}

/// A one-shot message for the next page render.
pub fn flash_cookie(message: &str, web: &WebSettings) -> Option<HeaderValue> {
    let mut cookie = base_cookie(FLASH_COOKIE, message.to_owned(), web);
    cookie.set_max_age(Duration::minutes(5));
    header(cookie)
}

pub fn clear_flash(web: &WebSettings) -> Option<HeaderValue> {
    expired(FLASH_COOKIE, web)
}

/// Appends a `Set-Cookie` header when one could be built.
pub fn with_cookie(mut response: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(value) = cookie {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

fn identity(parts: &Parts, state: &AppState) -> Option<Identity> {
    let token = read_cookie(&parts.headers, SESSION_COOKIE)?;
    state.tokens.verify(&token).ok()
}

/// The logged-in user, if any.
pub struct MaybeUser(pub Option<Identity>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(identity(parts, state)))
    }
}

/// Requires a logged-in user; anyone else is sent to the login page and back.
pub struct RequireUser(pub Identity);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = identity(parts, state) {
            return Ok(Self(user));
        }
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| parts.uri.clone());
        let next = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        Err(Redirect::to(&login_url(next)).into_response())
    }
}

pub fn login_url(next: &str) -> String {
    match serde_urlencoded::to_string([("next", next)]) {
        Ok(query) => format!("/users/login?{query}"),
        Err(_) => "/users/login".to_owned(),
    }
}

/// Only same-site absolute paths are followed after login.
pub fn safe_next(next: &str) -> &str {
    let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    if local {
        next
    } else {
        "/"
    }
}

/// The peer address when the server was started with connect info.
pub struct ClientIp(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
        ))
    }
}
