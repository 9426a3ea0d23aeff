use std::time::Duration;

use tracing::{debug, info};

use storefront_auth_types::token::TokenInfo;

use crate::domain::repository::SessionInfrastructure;
use crate::domain::types::{Identity, Session};
use crate::error::AuthServiceError;
use crate::usecase::bounded;

// ── Mint ──────────────────────────────────────────────────────────────────────

/// Turns a resolved identity into a fresh session.
///
/// The session infrastructure only issues sessions for credentials, so the minter
/// synthesizes a one-time bootstrap credential for the identity's login key and redeems
/// it in the same call. The credential never leaves this function.
pub struct SessionMinter<X>
where
    X: SessionInfrastructure,
{
    pub sessions: X,
    pub call_timeout: Duration,
}

impl<X> SessionMinter<X>
where
    X: SessionInfrastructure,
{
    pub async fn mint(&self, identity: &Identity) -> Result<Session, AuthServiceError> {
        let credential = bounded(
            self.call_timeout,
            "bootstrap credential mint",
            self.sessions.mint_bootstrap_credential(identity),
            AuthServiceError::MintFailure,
        )
        .await
        .map_err(AuthServiceError::into_mint_failure)?;

        let session = bounded(
            self.call_timeout,
            "bootstrap credential redeem",
            self.sessions.redeem(credential),
            AuthServiceError::MintFailure,
        )
        .await
        .map_err(AuthServiceError::into_mint_failure)?;

        if session.identity_id != identity.id {
            return Err(AuthServiceError::MintFailure(anyhow::anyhow!(
                "redeemed session belongs to a different identity"
            )));
        }

        debug!(identity_id = %identity.id, "session minted");
        Ok(session)
    }
}

// ── Check ─────────────────────────────────────────────────────────────────────

pub struct CheckSessionInput {
    pub access_token: String,
}

pub struct CheckSessionUseCase<X>
where
    X: SessionInfrastructure,
{
    pub sessions: X,
    pub call_timeout: Duration,
}

impl<X> CheckSessionUseCase<X>
where
    X: SessionInfrastructure,
{
    pub async fn execute(&self, input: CheckSessionInput) -> Result<TokenInfo, AuthServiceError> {
        bounded(
            self.call_timeout,
            "session check",
            self.sessions.check(&input.access_token),
            AuthServiceError::StoreFailure,
        )
        .await
    }
}

// ── SignOut ───────────────────────────────────────────────────────────────────

pub struct SignOutInput {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

pub struct SignOutUseCase<X>
where
    X: SessionInfrastructure,
{
    pub sessions: X,
    pub call_timeout: Duration,
}

impl<X> SignOutUseCase<X>
where
    X: SessionInfrastructure,
{
    pub async fn execute(&self, input: SignOutInput) -> Result<(), AuthServiceError> {
        bounded(
            self.call_timeout,
            "session invalidate",
            self.sessions
                .invalidate(&input.access_token, input.refresh_token.as_deref()),
            AuthServiceError::StoreFailure,
        )
        .await?;
        info!("session invalidated");
        Ok(())
    }
}
