//! Identity store adapter for the managed backend's admin REST API.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list | `GET /admin/users?page=&per_page=` → `{"users": [{"id", "phone"}]}` |
//! | create | `POST /admin/users` → `{"id", "phone"}`, `409`/`422` when the phone is taken |
//! | get profile | `GET /profiles/{id}` → profile, `404` when absent |
//! | profile stub | `POST /profiles` → `201`, `409` when it already exists |
//!
//! Every request carries the service key as both `apikey` and bearer token.

use anyhow::{Context as _, anyhow};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use storefront_domain::id::IdentityId;
use storefront_domain::pagination::PageRequest;

use crate::domain::repository::IdentityStore;
use crate::domain::types::{CreateOutcome, Identity, IdentityAttrs, IdentityPage, Profile};
use crate::error::AuthServiceError;

const API_KEY_HEADER: &str = "apikey";

#[derive(Clone)]
pub struct AdminApiIdentityStore {
    http: Client,
    base_url: String,
    api_key: String,
}

impl AdminApiIdentityStore {
    pub fn new(http: Client, base_url: &str, api_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        }
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(API_KEY_HEADER, &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[derive(Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Deserialize)]
struct UserRecord {
    id: IdentityId,
    /// Accounts created through other channels may have no phone.
    #[serde(default)]
    phone: Option<String>,
}

#[derive(Serialize)]
struct CreateUserBody<'a> {
    phone: &'a str,
    #[serde(flatten)]
    attrs: &'a IdentityAttrs,
}

#[derive(Serialize)]
struct ProfileStubBody<'a> {
    id: IdentityId,
    phone: &'a str,
}

impl UserRecord {
    fn into_identity(self) -> Option<Identity> {
        self.phone.map(|identifier| Identity {
            id: self.id,
            identifier,
        })
    }
}

async fn fail_with_body(op: &str, resp: Response) -> anyhow::Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    anyhow!("{op}: identity api returned {status}: {body}")
}

impl IdentityStore for AdminApiIdentityStore {
    async fn list(&self, page: PageRequest) -> Result<IdentityPage, AuthServiceError> {
        let resp = self
            .authorized(self.http.get(self.url("/admin/users")))
            .query(&[("page", page.page), ("per_page", page.per_page)])
            .send()
            .await
            .context("list identities")?;
        if !resp.status().is_success() {
            return Err(fail_with_body("list identities", resp).await.into());
        }
        let list: UserList = resp.json().await.context("decode identity page")?;
        let raw_len = list.users.len();
        Ok(IdentityPage {
            identities: list
                .users
                .into_iter()
                .filter_map(UserRecord::into_identity)
                .collect(),
            raw_len,
        })
    }

    async fn create(
        &self,
        identifier: &str,
        attrs: &IdentityAttrs,
    ) -> Result<CreateOutcome, AuthServiceError> {
        let body = CreateUserBody {
            phone: identifier,
            attrs,
        };
        let resp = self
            .authorized(self.http.post(self.url("/admin/users")))
            .json(&body)
            .send()
            .await
            .context("create identity")?;
        match resp.status() {
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Ok(CreateOutcome::AlreadyExists)
            }
            s if s.is_success() => {
                let user: UserRecord = resp.json().await.context("decode created identity")?;
                Ok(CreateOutcome::Created(Identity {
                    id: user.id,
                    identifier: user.phone.unwrap_or_else(|| identifier.to_owned()),
                }))
            }
            _ => Err(fail_with_body("create identity", resp).await.into()),
        }
    }

    async fn get_profile(&self, id: IdentityId) -> Result<Option<Profile>, AuthServiceError> {
        let resp = self
            .authorized(self.http.get(self.url(&format!("/profiles/{id}"))))
            .send()
            .await
            .context("get profile")?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let profile: Profile = resp.json().await.context("decode profile")?;
                Ok(Some(profile))
            }
            _ => Err(fail_with_body("get profile", resp).await.into()),
        }
    }

    async fn create_profile_stub(
        &self,
        id: IdentityId,
        identifier: &str,
    ) -> Result<(), AuthServiceError> {
        let resp = self
            .authorized(self.http.post(self.url("/profiles")))
            .json(&ProfileStubBody {
                id,
                phone: identifier,
            })
            .send()
            .await
            .context("create profile stub")?;
        let status = resp.status();
        if status.is_success() || status == StatusCode::CONFLICT {
            return Ok(());
        }
        Err(fail_with_body("create profile stub", resp).await.into())
    }
}
