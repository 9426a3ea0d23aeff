use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use storefront_domain::identifier::mask;
use storefront_domain::pagination::PageRequest;

use crate::domain::repository::IdentityStore;
use crate::domain::types::{CreateOutcome, Identity, IdentityAttrs, Resolution};
use crate::error::AuthServiceError;
use crate::usecase::bounded;

/// Paging budget for identity lookups.
#[derive(Debug, Clone, Copy)]
pub struct ResolverPolicy {
    pub page_size: u32,
    /// Pages read after a create conflict, beyond the first one.
    pub extra_pages: u32,
    pub call_timeout: Duration,
}

/// Maps a verified identifier to exactly one identity, creating or recovering one as needed.
pub struct IdentityResolver<S>
where
    S: IdentityStore,
{
    pub store: S,
    pub policy: ResolverPolicy,
}

impl<S> IdentityResolver<S>
where
    S: IdentityStore,
{
    pub async fn resolve(&self, identifier: &str) -> Result<Resolution, AuthServiceError> {
        // 1. First page
        let first = PageRequest::first(self.policy.page_size);
        if let Some(identity) = self.find_on_page(identifier, first).await? {
            let profile_complete = self.profile_complete(&identity).await;
            return Ok(Resolution {
                identity,
                is_new_identity: false,
                profile_complete,
            });
        }

        // 2. Create
        let created = bounded(
            self.policy.call_timeout,
            "identity create",
            self.store.create(identifier, &IdentityAttrs::canonical()),
            AuthServiceError::StoreFailure,
        )
        .await?;
        if let CreateOutcome::Created(identity) = created {
            info!(identity_id = %identity.id, phone = %mask(identifier), "identity created");
            self.create_stub(&identity).await;
            return Ok(Resolution {
                identity,
                is_new_identity: true,
                profile_complete: false,
            });
        }

        // 3. Conflict: the store knows the identifier but the first page did not show it
        warn!(phone = %mask(identifier), "identity create conflict, widening search");
        if let Some(identity) = self.widen(identifier).await? {
            let profile_complete = self.profile_complete(&identity).await;
            return Ok(Resolution {
                identity,
                is_new_identity: !profile_complete,
                profile_complete,
            });
        }

        self.create_disambiguated(identifier).await
    }

    async fn find_on_page(
        &self,
        identifier: &str,
        page: PageRequest,
    ) -> Result<Option<Identity>, AuthServiceError> {
        let listed = bounded(
            self.policy.call_timeout,
            "identity list",
            self.store.list(page),
            AuthServiceError::StoreFailure,
        )
        .await?;
        Ok(listed
            .identities
            .into_iter()
            .find(|i| i.identifier == identifier))
    }

    /// Re-read the first page (a concurrent create may have landed there), then
    /// up to `extra_pages` more. Stops early only when the store returns no rows at all;
    /// a page whose rows all lack an identifier still counts against the budget.
    async fn widen(&self, identifier: &str) -> Result<Option<Identity>, AuthServiceError> {
        let mut page = PageRequest::first(self.policy.page_size);
        for _ in 0..=self.policy.extra_pages {
            let listed = bounded(
                self.policy.call_timeout,
                "identity list",
                self.store.list(page),
                AuthServiceError::StoreFailure,
            )
            .await?;
            if listed.is_end() {
                break;
            }
            if let Some(found) = listed
                .identities
                .into_iter()
                .find(|i| i.identifier == identifier)
            {
                info!(identity_id = %found.id, page = page.page, "identity found after widening");
                return Ok(Some(found));
            }
            page = page.next();
        }
        Ok(None)
    }

    async fn create_disambiguated(&self, identifier: &str) -> Result<Resolution, AuthServiceError> {
        let variant = disambiguate(identifier);
        warn!(
            phone = %mask(identifier),
            "identity not found after widening, creating disambiguated identity"
        );

        let outcome = bounded(
            self.policy.call_timeout,
            "identity create (disambiguated)",
            self.store
                .create(&variant, &IdentityAttrs::disambiguated(identifier)),
            AuthServiceError::RecoveryFailure,
        )
        .await
        .map_err(|e| match e {
            AuthServiceError::RecoveryFailure(_) => e,
            other => AuthServiceError::RecoveryFailure(anyhow::Error::new(other)),
        })?;

        match outcome {
            CreateOutcome::Created(identity) => {
                info!(identity_id = %identity.id, "disambiguated identity created");
                self.create_stub(&identity).await;
                Ok(Resolution {
                    identity,
                    is_new_identity: true,
                    profile_complete: false,
                })
            }
            CreateOutcome::AlreadyExists => Err(AuthServiceError::RecoveryFailure(anyhow::anyhow!(
                "disambiguated identifier also reported as existing"
            ))),
        }
    }

    /// Profile completeness is a UX hint; lookup failures degrade to `false`.
    async fn profile_complete(&self, identity: &Identity) -> bool {
        let lookup = bounded(
            self.policy.call_timeout,
            "profile get",
            self.store.get_profile(identity.id),
            AuthServiceError::StoreFailure,
        )
        .await;
        match lookup {
            Ok(profile) => profile.is_some_and(|p| p.is_complete()),
            Err(e) => {
                warn!(identity_id = %identity.id, error = %e, "profile lookup failed");
                false
            }
        }
    }

    async fn create_stub(&self, identity: &Identity) {
        let stub = bounded(
            self.policy.call_timeout,
            "profile stub create",
            self.store.create_profile_stub(identity.id, &identity.identifier),
            AuthServiceError::StoreFailure,
        )
        .await;
        if let Err(e) = stub {
            warn!(identity_id = %identity.id, error = %e, "profile stub not created");
        }
    }
}

/// `<identifier>-<8 hex chars>`
pub fn disambiguate(identifier: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{identifier}-{}", &token[..8])
}
