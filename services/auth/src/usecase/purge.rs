use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::domain::repository::OtpRepository;
use crate::error::AuthServiceError;
use crate::usecase::bounded;

/// Deletes OTP records whose expiry is older than the retention window.
pub struct PurgeExpiredOtpsUseCase<O>
where
    O: OtpRepository,
{
    pub otps: O,
    pub retention: chrono::Duration,
    pub call_timeout: Duration,
}

impl<O> PurgeExpiredOtpsUseCase<O>
where
    O: OtpRepository,
{
    pub async fn execute(&self) -> Result<u64, AuthServiceError> {
        let before = Utc::now() - self.retention;
        let removed = bounded(
            self.call_timeout,
            "otp purge",
            self.otps.purge_expired(before),
            AuthServiceError::StoreFailure,
        )
        .await?;
        if removed > 0 {
            info!(removed, %before, "purged expired otp codes");
        }
        Ok(removed)
    }
}
