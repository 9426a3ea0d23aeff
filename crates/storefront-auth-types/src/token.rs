//! Session JWT claims and validation.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_domain::id::IdentityId;

/// Which half of the session pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Identity extracted from a validated session token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub identity_id: IdentityId,
    pub login_key: String,
    pub kind: TokenKind,
    /// Unique token id, used as the revocation key.
    pub jti: Uuid,
    pub exp: u64,
}

/// Errors returned by [`validate_session_token`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("wrong token kind")]
    WrongKind,
    #[error("malformed token")]
    Malformed,
}

/// JWT claims payload for both session tokens.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | identity id (UUID string) |
/// | `login_key` | custom | identifier the session was minted for |
/// | `kind` | custom | `access` or `refresh` |
/// | `jti` | `jti` | unique token id (UUID string) |
/// | `exp` | `exp` | seconds since epoch |
///
/// [`Serialize`] requires the **`issuer`** cargo feature; only the auth service mints tokens.
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "issuer", test), derive(Serialize))]
pub struct SessionClaims {
    pub sub: String,
    pub login_key: String,
    pub kind: TokenKind,
    pub jti: String,
    pub exp: u64,
}

/// Validate a session token of the expected kind.
///
/// HS256, `exp` checked with the library's default 60s leeway, `sub` + `exp` required.
/// Revocation is not checked here; that needs the issuer's revocation store.
pub fn validate_session_token(
    token: &str,
    secret: &str,
    expected: TokenKind,
) -> Result<TokenInfo, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    let claims = data.claims;
    if claims.kind != expected {
        return Err(AuthError::WrongKind);
    }
    let identity_id = claims
        .sub
        .parse::<IdentityId>()
        .map_err(|_| AuthError::Malformed)?;
    let jti = claims.jti.parse::<Uuid>().map_err(|_| AuthError::Malformed)?;

    Ok(TokenInfo {
        identity_id,
        login_key: claims.login_key,
        kind: claims.kind,
        jti,
        exp: claims.exp,
    })
}
