use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use storefront_auth_types::wire::SessionTokens;
use storefront_domain::id::IdentityId;

use crate::error::ClientError;

/// Session artifacts persisted between client runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub identity_id: IdentityId,
    pub tokens: SessionTokens,
}

/// Where the client keeps its session between runs.
pub trait SessionStorage: Send + Sync + 'static {
    fn load(&self) -> impl Future<Output = Result<Option<StoredSession>, ClientError>> + Send;

    fn save(&self, session: &StoredSession) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Remove everything. Clearing an empty storage succeeds.
    fn clear(&self) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> Result<Option<StoredSession>, ClientError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, session: &StoredSession) -> Result<(), ClientError> {
        let bytes = serde_json::to_vec(session)?;
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        // Readers see either the old file or the new one.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage, for tests and clients that never persist.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    slot: Arc<Mutex<Option<StoredSession>>>,
}

impl MemorySessionStorage {
    pub fn with(session: StoredSession) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(session))),
        }
    }

    pub fn peek(&self) -> Option<StoredSession> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }
}

impl SessionStorage for MemorySessionStorage {
    async fn load(&self) -> Result<Option<StoredSession>, ClientError> {
        Ok(self.peek())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), ClientError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(session.clone());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
        Ok(())
    }
}
