use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;

use storefront_auth_types::cookie::set_session_cookies;
use storefront_auth_types::wire::{Ack, IssueOtpRequest, VerifyOtpRequest, VerifyOtpResponse};

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::issue::IssueOtpInput;
use crate::usecase::verify::VerifyOtpInput;

// ── POST /auth/otp ────────────────────────────────────────────────────────────

pub async fn issue_otp(
    State(state): State<AppState>,
    Json(body): Json<IssueOtpRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    state
        .issue_otp()
        .execute(IssueOtpInput {
            identifier: body.identifier,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(Ack::OK)))
}

// ── POST /auth/otp/verify ─────────────────────────────────────────────────────

pub async fn verify_otp(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let out = state
        .verify_otp()
        .execute(VerifyOtpInput {
            identifier: body.identifier,
            code: body.code,
        })
        .await?;

    let tokens = out.session.tokens;
    let jar = set_session_cookies(
        jar,
        tokens.access_token.clone(),
        tokens.refresh_token.clone(),
        state.cookie_domain.clone(),
    );

    let resp = VerifyOtpResponse {
        ok: true,
        identity_id: out.identity_id,
        is_new_identity: out.is_new_identity,
        profile_complete: out.profile_complete,
        session: tokens,
    };
    Ok((StatusCode::CREATED, jar, Json(resp)))
}
