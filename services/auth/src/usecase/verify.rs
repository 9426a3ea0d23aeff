use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use storefront_domain::id::IdentityId;
use storefront_domain::identifier::mask;

use crate::domain::repository::{IdentityStore, OtpRepository, SessionInfrastructure};
use crate::domain::types::Session;
use crate::error::AuthServiceError;
use crate::usecase::bounded;
use crate::usecase::resolve::IdentityResolver;
use crate::usecase::session::SessionMinter;

pub struct VerifyOtpInput {
    pub identifier: String,
    pub code: String,
}

#[derive(Debug)]
pub struct VerifyOtpOutput {
    pub identity_id: IdentityId,
    pub is_new_identity: bool,
    pub profile_complete: bool,
    pub session: Session,
}

pub struct VerifyOtpUseCase<O, S, X>
where
    O: OtpRepository,
    S: IdentityStore,
    X: SessionInfrastructure,
{
    pub otps: O,
    pub resolver: IdentityResolver<S>,
    pub minter: SessionMinter<X>,
    pub call_timeout: Duration,
}

impl<O, S, X> VerifyOtpUseCase<O, S, X>
where
    O: OtpRepository,
    S: IdentityStore,
    X: SessionInfrastructure,
{
    pub async fn execute(&self, input: VerifyOtpInput) -> Result<VerifyOtpOutput, AuthServiceError> {
        // 1. Lookup (exact identifier, no shape check: unknown strings simply have no code)
        let record = bounded(
            self.call_timeout,
            "otp lookup",
            self.otps.find_active(&input.identifier),
            AuthServiceError::StoreFailure,
        )
        .await?
        .ok_or(AuthServiceError::NotFound)?;

        // 2. Expiry, record left untouched
        let now = Utc::now();
        if record.is_expired_at(now) {
            return Err(AuthServiceError::Expired);
        }

        // 3. Code, record stays unconsumed on mismatch
        if !constant_time_eq(record.code.as_bytes(), input.code.as_bytes()) {
            warn!(phone = %mask(&input.identifier), otp_id = %record.id, "otp mismatch");
            return Err(AuthServiceError::Mismatch);
        }

        // 4. Consume before resolving. Losing the race reads as "no active code".
        let consumed = bounded(
            self.call_timeout,
            "otp consume",
            self.otps.consume(record.id, now),
            AuthServiceError::StoreFailure,
        )
        .await?;
        if !consumed {
            return Err(AuthServiceError::NotFound);
        }

        // 5. Resolve + mint. Failures from here on leave the record consumed.
        let resolution = self.resolver.resolve(&record.identifier).await?;
        let session = self.minter.mint(&resolution.identity).await?;

        info!(
            identity_id = %resolution.identity.id,
            is_new_identity = resolution.is_new_identity,
            "otp verified"
        );
        Ok(VerifyOtpOutput {
            identity_id: resolution.identity.id,
            is_new_identity: resolution.is_new_identity,
            profile_complete: resolution.profile_complete,
            session,
        })
    }
}

/// Compare without an early exit on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
