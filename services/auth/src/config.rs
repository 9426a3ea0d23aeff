use std::time::Duration;

use serde::Deserialize;

use storefront_core::config::Config;

use crate::domain::types::{
    DEFAULT_CALL_TIMEOUT_MS, DEFAULT_IDENTITY_EXTRA_PAGES, DEFAULT_IDENTITY_PAGE_SIZE,
    DEFAULT_OTP_TTL_SECS,
};
use crate::usecase::resolve::ResolverPolicy;

/// Auth service configuration, one env var per field (`auth_port` reads `AUTH_PORT`).
#[derive(Deserialize)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL (bootstrap credentials, revocations). Without it sessions
    /// live in process memory, which only suits a single instance.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// HMAC secret for signing session tokens.
    pub jwt_secret: String,
    /// Cookie domain attribute (root domain, e.g. "shop.example").
    pub cookie_domain: String,
    #[serde(default = "default_port")]
    pub auth_port: u16,

    /// Base URL of the managed backend's admin API.
    pub identity_api_url: String,
    pub identity_api_key: String,

    /// SMS gateway credentials. When any is missing codes are only logged (masked).
    #[serde(default)]
    pub twilio_account_sid: Option<String>,
    #[serde(default)]
    pub twilio_auth_token: Option<String>,
    #[serde(default)]
    pub twilio_from_number: Option<String>,
    #[serde(default = "default_twilio_base")]
    pub twilio_api_base: String,

    #[serde(default = "default_otp_ttl")]
    pub otp_ttl_secs: i64,
    #[serde(default = "default_page_size")]
    pub identity_page_size: u32,
    #[serde(default = "default_extra_pages")]
    pub identity_extra_pages: u32,
    /// Bound on every store, dispatch and session call.
    #[serde(default = "default_call_timeout")]
    pub external_call_timeout_ms: u64,

    /// How long expired codes are kept before the purge task deletes them.
    #[serde(default = "default_retention")]
    pub otp_retention_secs: i64,
    #[serde(default = "default_purge_interval")]
    pub otp_purge_interval_secs: u64,
}

impl Config for AuthConfig {}

fn default_port() -> u16 {
    3112
}

fn default_twilio_base() -> String {
    crate::infra::sms::TWILIO_API_BASE.to_owned()
}

fn default_otp_ttl() -> i64 {
    DEFAULT_OTP_TTL_SECS
}

fn default_page_size() -> u32 {
    DEFAULT_IDENTITY_PAGE_SIZE
}

fn default_extra_pages() -> u32 {
    DEFAULT_IDENTITY_EXTRA_PAGES
}

fn default_call_timeout() -> u64 {
    DEFAULT_CALL_TIMEOUT_MS
}

fn default_retention() -> i64 {
    86_400
}

fn default_purge_interval() -> u64 {
    3_600
}

/// Twilio credentials, present only when all three are configured.
pub struct TwilioCredentials<'a> {
    pub account_sid: &'a str,
    pub auth_token: &'a str,
    pub from_number: &'a str,
}

impl AuthConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.external_call_timeout_ms)
    }

    pub fn otp_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.otp_ttl_secs)
    }

    pub fn otp_retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.otp_retention_secs)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.otp_purge_interval_secs.max(1))
    }

    pub fn resolver_policy(&self) -> ResolverPolicy {
        ResolverPolicy {
            page_size: self.identity_page_size.max(1),
            extra_pages: self.identity_extra_pages,
            call_timeout: self.call_timeout(),
        }
    }

    pub fn twilio(&self) -> Option<TwilioCredentials<'_>> {
        Some(TwilioCredentials {
            account_sid: self.twilio_account_sid.as_deref()?,
            auth_token: self.twilio_auth_token.as_deref()?,
            from_number: self.twilio_from_number.as_deref()?,
        })
    }
}
