use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;

use storefront_auth_types::cookie::{
    ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, clear_session_cookies,
};
use storefront_auth_types::wire::{SessionStatusResponse, SignOutRequest};

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::session::{CheckSessionInput, SignOutInput};

/// Bearer header first, then the access-token cookie.
pub(crate) fn access_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    bearer
        .map(str::to_owned)
        .or_else(|| jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_owned()))
}

// ── GET /auth/session ─────────────────────────────────────────────────────────

pub async fn check_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthServiceError> {
    let access_token = access_token(&headers, &jar).ok_or(AuthServiceError::InvalidToken)?;

    let info = state
        .check_session()
        .execute(CheckSessionInput { access_token })
        .await?;

    Ok(Json(SessionStatusResponse {
        identity_id: info.identity_id,
        access_token_exp: info.exp,
    }))
}

// ── DELETE /auth/session ──────────────────────────────────────────────────────

pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    body: Option<Json<SignOutRequest>>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let access_token = access_token(&headers, &jar).ok_or(AuthServiceError::InvalidToken)?;
    let refresh_token = body
        .and_then(|Json(b)| b.refresh_token)
        .or_else(|| jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_owned()));

    state
        .sign_out()
        .execute(SignOutInput {
            access_token,
            refresh_token,
        })
        .await?;

    let jar = clear_session_cookies(jar, state.cookie_domain.clone());
    Ok((StatusCode::NO_CONTENT, jar))
}
