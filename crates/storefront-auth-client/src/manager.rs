use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;

use storefront_auth_types::wire::{SessionTokens, VerifyOtpResponse};
use storefront_domain::id::IdentityId;

use crate::backend::AuthBackend;
use crate::error::{ClientError, UserFacingError};
use crate::state::{AuthState, SessionInfo};
use crate::storage::{SessionStorage, StoredSession};

/// Session changes that originate outside the manager.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Expired,
    Revoked,
    /// Tokens were refreshed elsewhere.
    Updated(StoredSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub identity_id: IdentityId,
    pub is_new_identity: bool,
    pub profile_complete: bool,
}

impl From<&VerifyOtpResponse> for VerifyOutcome {
    fn from(resp: &VerifyOtpResponse) -> Self {
        Self {
            identity_id: resp.identity_id,
            is_new_identity: resp.is_new_identity,
            profile_complete: resp.profile_complete,
        }
    }
}

fn info_of(session: &StoredSession) -> SessionInfo {
    SessionInfo {
        identity_id: session.identity_id,
        access_token_exp: session.tokens.access_token_exp,
    }
}

struct Inner<B, S> {
    backend: B,
    storage: S,
    state: watch::Sender<AuthState>,
    /// The adopted session. Every state change other than `start` happens under this lock.
    current: Mutex<Option<StoredSession>>,
}

/// Owns the authentication state of one client process.
///
/// Consumers call [`SessionManager::subscribe`] and react to changes on the returned
/// receiver. Cloning is cheap and every clone drives the same state.
pub struct SessionManager<B, S> {
    inner: Arc<Inner<B, S>>,
}

impl<B, S> Clone for SessionManager<B, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: AuthBackend, S: SessionStorage> SessionManager<B, S> {
    pub fn new(backend: B, storage: S) -> Self {
        let (state, _) = watch::channel(AuthState::Anonymous);
        Self {
            inner: Arc::new(Inner {
                backend,
                storage,
                state,
                current: Mutex::new(None),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Tokens of the adopted session, for authorizing calls to other services.
    pub async fn tokens(&self) -> Option<SessionTokens> {
        self.inner.current.lock().await.as_ref().map(|s| s.tokens.clone())
    }

    /// Move to `Restoring` and check for a persisted session in the background.
    ///
    /// Returns `None` when the manager has already left `Anonymous`.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        let began = self.inner.state.send_if_modified(|state| {
            if *state == AuthState::Anonymous {
                *state = AuthState::Restoring;
                true
            } else {
                false
            }
        });
        if !began {
            return None;
        }
        let this = self.clone();
        Some(tokio::spawn(async move { this.restore().await }))
    }

    async fn restore(&self) {
        let stored = match self.inner.storage.load().await {
            Ok(stored) => stored,
            Err(ClientError::Corrupt(e)) => {
                tracing::warn!(error = %e, "discarding unreadable stored session");
                return self.finish_restore(None, true).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored session");
                None
            }
        };
        let Some(stored) = stored else {
            return self.finish_restore(None, false).await;
        };

        match self.inner.backend.check_session(&stored.tokens.access_token).await {
            Ok(Some(status)) if status.identity_id == stored.identity_id => {
                let mut stored = stored;
                stored.tokens.access_token_exp = status.access_token_exp;
                self.finish_restore(Some(stored), false).await;
            }
            Ok(_) => {
                tracing::info!("stored session no longer valid");
                self.finish_restore(None, true).await;
            }
            Err(e) => {
                // Keep the stored session; the next start may reach the service.
                tracing::warn!(error = %e, "session check failed");
                self.finish_restore(None, false).await;
            }
        }
    }

    async fn finish_restore(&self, found: Option<StoredSession>, clear_stale: bool) {
        let mut current = self.inner.current.lock().await;
        let restoring = *self.inner.state.borrow() == AuthState::Restoring;
        if !restoring {
            tracing::debug!("restore superseded");
            return;
        }
        if clear_stale {
            if let Err(e) = self.inner.storage.clear().await {
                tracing::warn!(error = %e, "failed to clear stale session");
            }
        }
        let next = match found {
            Some(session) => {
                let info = info_of(&session);
                *current = Some(session);
                AuthState::Authenticated(info)
            }
            None => AuthState::Anonymous,
        };
        self.inner.state.send_replace(next);
    }

    pub async fn issue_otp(&self, identifier: &str) -> Result<(), UserFacingError> {
        self.inner.backend.issue_otp(identifier).await.map_err(|e| {
            tracing::warn!(kind = e.kind().as_str(), error = %e, "otp issuance failed");
            e.user_facing()
        })
    }

    /// Verify a code and adopt the returned session, even while a restore is in flight.
    pub async fn verify_otp(
        &self,
        identifier: &str,
        code: &str,
    ) -> Result<VerifyOutcome, UserFacingError> {
        let resp = self
            .inner
            .backend
            .verify_otp(identifier, code)
            .await
            .map_err(|e| {
                tracing::warn!(kind = e.kind().as_str(), error = %e, "otp verification failed");
                e.user_facing()
            })?;
        let outcome = VerifyOutcome::from(&resp);

        self.adopt(StoredSession {
            identity_id: resp.identity_id,
            tokens: resp.session,
        })
        .await;
        Ok(outcome)
    }

    async fn adopt(&self, session: StoredSession) {
        let mut current = self.inner.current.lock().await;
        if let Err(e) = self.inner.storage.save(&session).await {
            tracing::warn!(error = %e, "session not persisted");
        }
        let info = info_of(&session);
        *current = Some(session);
        self.inner.state.send_replace(AuthState::Authenticated(info));
    }

    /// Forget the session locally, then ask the service to invalidate it.
    ///
    /// Ends `Anonymous` whatever the service answers.
    pub async fn sign_out(&self) {
        let previous = {
            let mut current = self.inner.current.lock().await;
            let previous = match current.take() {
                Some(session) => Some(session),
                None => self.inner.storage.load().await.ok().flatten(),
            };
            if let Err(e) = self.inner.storage.clear().await {
                tracing::warn!(error = %e, "failed to clear stored session");
            }
            self.inner.state.send_replace(AuthState::Anonymous);
            previous
        };

        let Some(session) = previous else {
            return;
        };
        if let Err(e) = self.inner.backend.invalidate(&session.tokens).await {
            tracing::warn!(error = %e, "remote session invalidation failed");
        }
    }

    /// Apply one external session change.
    pub async fn apply(&self, event: SessionEvent) {
        match event {
            SessionEvent::Expired | SessionEvent::Revoked => {
                let mut current = self.inner.current.lock().await;
                let authenticated = self.inner.state.borrow().is_authenticated();
                if current.take().is_none() && !authenticated {
                    return;
                }
                tracing::info!(?event, "session ended externally");
                if let Err(e) = self.inner.storage.clear().await {
                    tracing::warn!(error = %e, "failed to clear stored session");
                }
                self.inner.state.send_replace(AuthState::Anonymous);
            }
            SessionEvent::Updated(session) => self.adopt(session).await,
        }
    }

    /// Apply events from `events` until the channel closes.
    pub fn listen(&self, mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => this.apply(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
