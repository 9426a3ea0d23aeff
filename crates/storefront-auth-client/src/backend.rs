use std::future::Future;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use storefront_auth_types::wire::{
    ErrorBody, IssueOtpRequest, SessionStatusResponse, SessionTokens, SignOutRequest,
    VerifyOtpRequest, VerifyOtpResponse,
};

use crate::error::ClientError;

/// The auth service as seen from a client.
pub trait AuthBackend: Send + Sync + 'static {
    fn issue_otp(&self, identifier: &str) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn verify_otp(
        &self,
        identifier: &str,
        code: &str,
    ) -> impl Future<Output = Result<VerifyOtpResponse, ClientError>> + Send;

    /// `Ok(None)` when the service no longer accepts the token.
    fn check_session(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Option<SessionStatusResponse>, ClientError>> + Send;

    fn invalidate(
        &self,
        tokens: &SessionTokens,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// [`AuthBackend`] over the service's JSON API.
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    http: Client,
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Turn a non-success response into [`ClientError`], keeping the service's error body if any.
async fn error_from(resp: Response) -> ClientError {
    let status = resp.status();
    match resp.json::<ErrorBody>().await {
        Ok(body) => ClientError::Api { status, body },
        Err(_) => ClientError::Status(status),
    }
}

async fn json_or_error<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    if !resp.status().is_success() {
        return Err(error_from(resp).await);
    }
    Ok(resp.json().await?)
}

impl AuthBackend for HttpAuthBackend {
    async fn issue_otp(&self, identifier: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.url("/auth/otp"))
            .json(&IssueOtpRequest {
                identifier: identifier.to_owned(),
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from(resp).await);
        }
        Ok(())
    }

    async fn verify_otp(&self, identifier: &str, code: &str) -> Result<VerifyOtpResponse, ClientError> {
        let resp = self
            .http
            .post(self.url("/auth/otp/verify"))
            .json(&VerifyOtpRequest {
                identifier: identifier.to_owned(),
                code: code.to_owned(),
            })
            .send()
            .await?;
        json_or_error(resp).await
    }

    async fn check_session(
        &self,
        access_token: &str,
    ) -> Result<Option<SessionStatusResponse>, ClientError> {
        let resp = self
            .http
            .get(self.url("/auth/session"))
            .bearer_auth(access_token)
            .send()
            .await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        json_or_error(resp).await.map(Some)
    }

    async fn invalidate(&self, tokens: &SessionTokens) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.url("/auth/session"))
            .bearer_auth(&tokens.access_token)
            .json(&SignOutRequest {
                refresh_token: Some(tokens.refresh_token.clone()),
            })
            .send()
            .await?;
        // A token the service already rejects is as signed out as it gets.
        if resp.status().is_success() || resp.status() == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        Err(error_from(resp).await)
    }
}
