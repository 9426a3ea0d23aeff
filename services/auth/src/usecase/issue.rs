use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::RngExt;
use tracing::{info, warn};

use storefront_domain::id::OtpId;
use storefront_domain::identifier::PhoneNumber;

use crate::domain::repository::{OtpDispatcher, OtpRepository};
use crate::domain::types::{OTP_CODE_LEN, OtpRecord};
use crate::error::AuthServiceError;
use crate::usecase::bounded;

const DIGITS: &[u8] = b"0123456789";

/// Fixed-length numeric code from the thread-local CSPRNG.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..OTP_CODE_LEN)
        .map(|_| DIGITS[rng.random_range(0..DIGITS.len())] as char)
        .collect()
}

pub struct IssueOtpInput {
    pub identifier: String,
}

#[derive(Debug)]
pub struct IssueOtpOutput {
    pub expires_at: DateTime<Utc>,
}

pub struct IssueOtpUseCase<O, D>
where
    O: OtpRepository,
    D: OtpDispatcher,
{
    pub otps: O,
    pub dispatcher: D,
    pub ttl: chrono::Duration,
    pub call_timeout: Duration,
}

impl<O, D> IssueOtpUseCase<O, D>
where
    O: OtpRepository,
    D: OtpDispatcher,
{
    pub async fn execute(&self, input: IssueOtpInput) -> Result<IssueOtpOutput, AuthServiceError> {
        // 1. Shape check before any side effect
        let phone =
            PhoneNumber::parse(&input.identifier).map_err(|_| AuthServiceError::InvalidIdentifier)?;

        // 2. Generate code + record
        let now = Utc::now();
        let record = OtpRecord {
            id: OtpId::new(),
            identifier: phone.as_str().to_owned(),
            code: generate_code(),
            issued_at: now,
            expires_at: now + self.ttl,
            consumed_at: None,
        };

        // 3. Supersede any live code and persist the new one in a single store operation
        bounded(
            self.call_timeout,
            "otp store upsert",
            self.otps.replace_active(&record),
            AuthServiceError::StoreFailure,
        )
        .await?;

        // 4. Dispatch. The record stays in place on failure; the next issuance supersedes it.
        if let Err(e) = bounded(
            self.call_timeout,
            "otp dispatch",
            self.dispatcher.send(&phone, &record.code),
            AuthServiceError::DispatchFailure,
        )
        .await
        {
            warn!(phone = %phone.masked(), otp_id = %record.id, "otp stored but dispatch failed");
            return Err(e);
        }

        info!(phone = %phone.masked(), otp_id = %record.id, "otp issued");
        Ok(IssueOtpOutput {
            expires_at: record.expires_at,
        })
    }
}
