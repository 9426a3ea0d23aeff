use anyhow::Context as _;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use rand::RngExt;
use tracing::debug;
use uuid::Uuid;

use storefront_auth_types::cookie::{ACCESS_TOKEN_EXP, REFRESH_TOKEN_EXP};
use storefront_auth_types::token::{SessionClaims, TokenInfo, TokenKind, validate_session_token};
use storefront_auth_types::wire::SessionTokens;

use crate::domain::repository::{SessionCache, SessionInfrastructure};
use crate::domain::types::{BOOTSTRAP_TTL_SECS, BootstrapCredential, BootstrapGrant, Identity, Session};
use crate::error::AuthServiceError;

/// Session infrastructure backed by HS256 JWT pairs.
///
/// Bootstrap credentials are random one-time secrets held in the cache for
/// [`BOOTSTRAP_TTL_SECS`]; redeeming deletes them. Invalidation stores the token's `jti`
/// until the token would have expired anyway.
#[derive(Clone)]
pub struct JwtSessionInfrastructure<C>
where
    C: SessionCache,
{
    pub cache: C,
    pub jwt_secret: String,
}

fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

fn random_secret() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl<C> JwtSessionInfrastructure<C>
where
    C: SessionCache,
{
    fn issue(
        &self,
        grant: &BootstrapGrant,
        kind: TokenKind,
        exp: u64,
    ) -> Result<String, AuthServiceError> {
        let claims = SessionClaims {
            sub: grant.identity_id.to_string(),
            login_key: grant.login_key.clone(),
            kind,
            jti: Uuid::new_v4().to_string(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .context("encode session token")
        .map_err(AuthServiceError::MintFailure)
    }

    async fn revoke_if_valid(&self, token: &str, kind: TokenKind) -> Result<(), AuthServiceError> {
        match validate_session_token(token, &self.jwt_secret, kind) {
            Ok(info) => {
                let ttl = info.exp.saturating_sub(now_secs());
                self.cache.revoke(info.jti, ttl).await
            }
            Err(e) => {
                debug!(?kind, error = %e, "ignoring unusable token on invalidate");
                Ok(())
            }
        }
    }
}

impl<C> SessionInfrastructure for JwtSessionInfrastructure<C>
where
    C: SessionCache,
{
    async fn mint_bootstrap_credential(
        &self,
        identity: &Identity,
    ) -> Result<BootstrapCredential, AuthServiceError> {
        let secret = random_secret();
        let grant = BootstrapGrant {
            identity_id: identity.id,
            login_key: identity.identifier.clone(),
        };
        self.cache
            .put_bootstrap(&secret, &grant, BOOTSTRAP_TTL_SECS)
            .await?;
        Ok(BootstrapCredential::new(secret))
    }

    async fn redeem(&self, credential: BootstrapCredential) -> Result<Session, AuthServiceError> {
        let grant = self
            .cache
            .take_bootstrap(credential.secret())
            .await?
            .ok_or_else(|| {
                AuthServiceError::MintFailure(anyhow::anyhow!(
                    "bootstrap credential unknown or already redeemed"
                ))
            })?;

        let now = now_secs();
        let access_token_exp = now + ACCESS_TOKEN_EXP;
        let access_token = self.issue(&grant, TokenKind::Access, access_token_exp)?;
        let refresh_token = self.issue(&grant, TokenKind::Refresh, now + REFRESH_TOKEN_EXP)?;

        Ok(Session {
            identity_id: grant.identity_id,
            tokens: SessionTokens {
                access_token,
                refresh_token,
                access_token_exp,
            },
        })
    }

    async fn check(&self, access_token: &str) -> Result<TokenInfo, AuthServiceError> {
        let info = validate_session_token(access_token, &self.jwt_secret, TokenKind::Access)
            .map_err(|_| AuthServiceError::InvalidToken)?;
        if self.cache.is_revoked(info.jti).await? {
            return Err(AuthServiceError::InvalidToken);
        }
        Ok(info)
    }

    async fn invalidate(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthServiceError> {
        self.revoke_if_valid(access_token, TokenKind::Access).await?;
        if let Some(refresh) = refresh_token {
            self.revoke_if_valid(refresh, TokenKind::Refresh).await?;
        }
        Ok(())
    }
}
