#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use storefront_auth_types::token::TokenInfo;
use storefront_domain::id::{IdentityId, OtpId};
use storefront_domain::identifier::PhoneNumber;
use storefront_domain::pagination::PageRequest;

use crate::domain::types::{
    BootstrapCredential, BootstrapGrant, CreateOutcome, Identity, IdentityAttrs, IdentityPage,
    OtpRecord, Profile, Session,
};
use crate::error::AuthServiceError;

/// Durable store of one-time passwords.
pub trait OtpRepository: Send + Sync {
    /// Make `record` the only unconsumed code for its identifier in one atomic step.
    /// Concurrent calls for the same identifier: last writer wins.
    async fn replace_active(&self, record: &OtpRecord) -> Result<(), AuthServiceError>;

    /// Most recent unconsumed record for the identifier, expired or not.
    async fn find_active(&self, identifier: &str) -> Result<Option<OtpRecord>, AuthServiceError>;

    /// Compare-and-swap `consumed_at` from NULL to `at`.
    /// Returns `true` only for the single caller that performed the transition.
    async fn consume(&self, id: OtpId, at: DateTime<Utc>) -> Result<bool, AuthServiceError>;

    /// Delete records that expired before `before`. Returns the number of rows removed.
    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, AuthServiceError>;
}

/// Out-of-band channel that delivers a code to the identifier's owner.
pub trait OtpDispatcher: Send + Sync {
    async fn send(&self, to: &PhoneNumber, code: &str) -> Result<(), AuthServiceError>;
}

/// Backing identity store. Lookup by identifier is only possible by enumeration.
pub trait IdentityStore: Send + Sync {
    /// One page of identities, in whatever order the store returns them.
    async fn list(&self, page: PageRequest) -> Result<IdentityPage, AuthServiceError>;

    async fn create(
        &self,
        identifier: &str,
        attrs: &IdentityAttrs,
    ) -> Result<CreateOutcome, AuthServiceError>;

    async fn get_profile(&self, id: IdentityId) -> Result<Option<Profile>, AuthServiceError>;

    /// Create an empty profile row for a new identity. Idempotent.
    async fn create_profile_stub(
        &self,
        id: IdentityId,
        identifier: &str,
    ) -> Result<(), AuthServiceError>;
}

/// Credential-based session issuance. There is no "session for identity id" primitive,
/// so callers mint a one-time bootstrap credential and redeem it.
pub trait SessionInfrastructure: Send + Sync {
    async fn mint_bootstrap_credential(
        &self,
        identity: &Identity,
    ) -> Result<BootstrapCredential, AuthServiceError>;

    async fn redeem(&self, credential: BootstrapCredential) -> Result<Session, AuthServiceError>;

    /// Validate an access token and make sure it has not been invalidated.
    async fn check(&self, access_token: &str) -> Result<TokenInfo, AuthServiceError>;

    /// Invalidate the session tokens. Unparsable or expired tokens are ignored.
    async fn invalidate(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthServiceError>;
}

/// Short-lived server-side state for the JWT session infrastructure (Redis, TTL-bound).
pub trait SessionCache: Send + Sync {
    async fn put_bootstrap(
        &self,
        secret: &str,
        grant: &BootstrapGrant,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError>;

    /// Read and delete in one step; a second call for the same secret returns `None`.
    async fn take_bootstrap(&self, secret: &str)
    -> Result<Option<BootstrapGrant>, AuthServiceError>;

    async fn revoke(&self, jti: Uuid, ttl_secs: u64) -> Result<(), AuthServiceError>;

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, AuthServiceError>;
}
