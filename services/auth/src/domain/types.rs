use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_auth_types::wire::SessionTokens;
use storefront_domain::id::{IdentityId, OtpId};

/// One-time password bound to an identifier.
#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub id: OtpId,
    pub identifier: String,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// `None` until verification consumes the record; never goes back to `None`.
    pub consumed_at: Option<DateTime<Utc>>,
}

impl OtpRecord {
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Account record in the identity store, keyed by its login identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: IdentityId,
    /// Canonical login key. Usually the phone number; a suffixed variant after recovery.
    pub identifier: String,
}

/// One page of the identity store's enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityPage {
    /// Identities on the page that carry an identifier.
    pub identities: Vec<Identity>,
    /// Rows the store returned, including ones without an identifier.
    pub raw_len: usize,
}

impl IdentityPage {
    /// The store has nothing at or beyond this page.
    pub fn is_end(&self) -> bool {
        self.raw_len == 0
    }
}

/// Attributes sent along with an identity creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityAttrs {
    pub phone_confirmed: bool,
    /// Set when the identifier is a disambiguated variant of this phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disambiguated_from: Option<String>,
}

impl IdentityAttrs {
    pub fn canonical() -> Self {
        Self {
            phone_confirmed: true,
            disambiguated_from: None,
        }
    }

    pub fn disambiguated(original: &str) -> Self {
        Self {
            phone_confirmed: true,
            disambiguated_from: Some(original.to_owned()),
        }
    }
}

/// Result of an identity creation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Identity),
    /// The store says the identifier is already bound to some identity.
    AlreadyExists,
}

/// Customer profile row kept next to the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Profile {
    /// Minimal profile: a non-blank name.
    pub fn is_complete(&self) -> bool {
        self.full_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }
}

/// Output of identity resolution for a verified identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub identity: Identity,
    pub is_new_identity: bool,
    pub profile_complete: bool,
}

/// Freshly minted session for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity_id: IdentityId,
    pub tokens: SessionTokens,
}

/// What a bootstrap credential grants when redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapGrant {
    pub identity_id: IdentityId,
    pub login_key: String,
}

/// One-time credential that the session infrastructure redeems for a session.
///
/// Constructed only inside this crate and never serialized, so it cannot reach a response.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapCredential {
    secret: String,
}

impl BootstrapCredential {
    pub(crate) fn new(secret: String) -> Self {
        Self { secret }
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for BootstrapCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BootstrapCredential(<redacted>)")
    }
}

/// OTP code length in digits.
pub const OTP_CODE_LEN: usize = 6;

/// Default OTP validity window in seconds (10 minutes).
pub const DEFAULT_OTP_TTL_SECS: i64 = 600;

/// Bootstrap credential lifetime in seconds. Redeemed in the same call, so this only bounds leaks.
pub const BOOTSTRAP_TTL_SECS: u64 = 60;

/// Default identity-store page size.
pub const DEFAULT_IDENTITY_PAGE_SIZE: u32 = 50;

/// Pages searched after a create conflict, on top of the first page.
pub const DEFAULT_IDENTITY_EXTRA_PAGES: u32 = 4;

/// Default bound on every store, dispatch and session call, in milliseconds.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 5000;
