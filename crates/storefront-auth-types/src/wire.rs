//! JSON bodies exchanged between the auth service and its clients.

use std::fmt;

use serde::{Deserialize, Serialize};

use storefront_domain::id::IdentityId;

/// `POST /auth/otp`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueOtpRequest {
    pub identifier: String,
}

/// `POST /auth/otp/verify`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub identifier: String,
    pub code: String,
}

/// `DELETE /auth/session` (body optional).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignOutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Plain success acknowledgement: `{"ok": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const OK: Self = Self { ok: true };
}

/// Bearer credential pair handed to the client after verification.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token expiry, seconds since UNIX epoch.
    pub access_token_exp: u64,
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("access_token_exp", &self.access_token_exp)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    pub ok: bool,
    pub identity_id: IdentityId,
    pub is_new_identity: bool,
    pub profile_complete: bool,
    pub session: SessionTokens,
}

/// `GET /auth/session`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    pub identity_id: IdentityId,
    pub access_token_exp: u64,
}

/// Machine-readable failure kind carried in every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidIdentifier,
    DispatchFailure,
    StoreFailure,
    OtpNotFound,
    OtpExpired,
    OtpMismatch,
    RecoveryFailure,
    MintFailure,
    InvalidToken,
    /// Anything a newer server sends that this build does not know.
    #[serde(other)]
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "INVALID_IDENTIFIER",
            Self::DispatchFailure => "DISPATCH_FAILURE",
            Self::StoreFailure => "STORE_FAILURE",
            Self::OtpNotFound => "OTP_NOT_FOUND",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpMismatch => "OTP_MISMATCH",
            Self::RecoveryFailure => "RECOVERY_FAILURE",
            Self::MintFailure => "MINT_FAILURE",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Error body: `{"ok": false, "kind": "...", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub kind: ErrorKind,
    pub message: String,
}
