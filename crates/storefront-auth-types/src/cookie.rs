//! Cookie builders for browser sessions.
//!
//! Non-browser clients get the same tokens in the JSON body and send them back as
//! `Authorization: Bearer`; browsers rely on these HttpOnly cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie name for the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "storefront_access_token";

/// Cookie name for the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "storefront_refresh_token";

/// Access-token JWT lifetime in seconds (1 hour).
pub const ACCESS_TOKEN_EXP: u64 = 3600;

/// Refresh-token JWT lifetime and cookie Max-Age in seconds (30 days).
pub const REFRESH_TOKEN_EXP: u64 = 2_592_000;

/// The refresh cookie is only sent to the session endpoints.
pub const REFRESH_COOKIE_PATH: &str = "/auth/session";

fn session_cookie(
    name: &'static str,
    value: String,
    path: &'static str,
    domain: String,
    max_age: Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(path)
        .domain(domain)
        .max_age(max_age)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Set both session cookies on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use storefront_auth_types::cookie::{set_session_cookies, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
///
/// let jar = set_session_cookies(CookieJar::new(), "a".into(), "r".into(), "shop.example".into());
/// let access = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
/// assert_eq!(access.path(), Some("/"));
/// assert_eq!(access.max_age(), Some(time::Duration::seconds(3600)));
/// let refresh = jar.get(REFRESH_TOKEN_COOKIE).unwrap();
/// assert_eq!(refresh.path(), Some("/auth/session"));
/// assert!(refresh.http_only().unwrap_or(false));
/// ```
pub fn set_session_cookies(
    jar: CookieJar,
    access_token: String,
    refresh_token: String,
    domain: String,
) -> CookieJar {
    let access = session_cookie(
        ACCESS_TOKEN_COOKIE,
        access_token,
        "/",
        domain.clone(),
        Duration::seconds(ACCESS_TOKEN_EXP as i64),
    );
    let refresh = session_cookie(
        REFRESH_TOKEN_COOKIE,
        refresh_token,
        REFRESH_COOKIE_PATH,
        domain,
        Duration::seconds(REFRESH_TOKEN_EXP as i64),
    );
    jar.add(access).add(refresh)
}

/// Clear both session cookies by setting Max-Age to 0.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use storefront_auth_types::cookie::{clear_session_cookies, set_session_cookies, ACCESS_TOKEN_COOKIE};
///
/// let jar = set_session_cookies(CookieJar::new(), "a".into(), "r".into(), "shop.example".into());
/// let jar = clear_session_cookies(jar, "shop.example".into());
/// assert_eq!(jar.get(ACCESS_TOKEN_COOKIE).unwrap().max_age(), Some(time::Duration::ZERO));
/// ```
pub fn clear_session_cookies(jar: CookieJar, domain: String) -> CookieJar {
    let access = session_cookie(
        ACCESS_TOKEN_COOKIE,
        String::new(),
        "/",
        domain.clone(),
        Duration::ZERO,
    );
    let refresh = session_cookie(
        REFRESH_TOKEN_COOKIE,
        String::new(),
        REFRESH_COOKIE_PATH,
        domain,
        Duration::ZERO,
    );
    jar.add(access).add(refresh)
}
