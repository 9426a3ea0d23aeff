use anyhow::{Context as _, anyhow};
use reqwest::Client;
use tracing::info;

use storefront_domain::identifier::PhoneNumber;

use crate::domain::repository::OtpDispatcher;
use crate::error::AuthServiceError;

pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

#[derive(Clone)]
pub struct TwilioSmsDispatcher {
    http: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl TwilioSmsDispatcher {
    pub fn new(
        http: Client,
        base_url: &str,
        account_sid: String,
        auth_token: String,
        from: String,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            account_sid,
            auth_token,
            from,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

fn message_body(code: &str) -> String {
    format!("Your verification code is {code}")
}

impl OtpDispatcher for TwilioSmsDispatcher {
    async fn send(&self, to: &PhoneNumber, code: &str) -> Result<(), AuthServiceError> {
        let body = message_body(code);
        let form = [
            ("To", to.as_str()),
            ("From", self.from.as_str()),
            ("Body", body.as_str()),
        ];
        let resp = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .context("send sms")
            .map_err(AuthServiceError::DispatchFailure)?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(AuthServiceError::DispatchFailure(anyhow!(
                "sms gateway returned {status}: {detail}"
            )));
        }
        info!(phone = %to.masked(), "sms dispatched");
        Ok(())
    }
}

/// Development dispatcher: records that a code was sent without sending anything.
#[derive(Clone, Default)]
pub struct LogDispatcher;

impl OtpDispatcher for LogDispatcher {
    async fn send(&self, to: &PhoneNumber, _code: &str) -> Result<(), AuthServiceError> {
        info!(phone = %to.masked(), "otp dispatch skipped (log dispatcher)");
        Ok(())
    }
}

/// Dispatcher chosen at startup from configuration.
#[derive(Clone)]
pub enum SmsDispatcher {
    Twilio(TwilioSmsDispatcher),
    Log(LogDispatcher),
}

impl OtpDispatcher for SmsDispatcher {
    async fn send(&self, to: &PhoneNumber, code: &str) -> Result<(), AuthServiceError> {
        match self {
            Self::Twilio(d) => d.send(to, code).await,
            Self::Log(d) => d.send(to, code).await,
        }
    }
}
