use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;
use tokio::time::Instant;
use uuid::Uuid;

use crate::domain::repository::SessionCache;
use crate::domain::types::BootstrapGrant;
use crate::error::AuthServiceError;

#[derive(Clone)]
pub struct RedisSessionCache {
    pub pool: Pool,
}

fn bootstrap_key(secret: &str) -> String {
    format!("bootstrap:{secret}")
}

fn revoked_key(jti: Uuid) -> String {
    format!("revoked:{jti}")
}

impl RedisSessionCache {
    async fn conn(&self) -> Result<deadpool_redis::Connection, AuthServiceError> {
        Ok(self.pool.get().await.context("redis pool checkout")?)
    }
}

impl SessionCache for RedisSessionCache {
    async fn put_bootstrap(
        &self,
        secret: &str,
        grant: &BootstrapGrant,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError> {
        let mut conn = self.conn().await?;
        let payload = serde_json::to_vec(grant).context("encode bootstrap grant")?;
        let (): () = conn
            .set_ex(bootstrap_key(secret), payload, ttl_secs)
            .await
            .context("store bootstrap credential")?;
        Ok(())
    }

    async fn take_bootstrap(
        &self,
        secret: &str,
    ) -> Result<Option<BootstrapGrant>, AuthServiceError> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = conn
            .get_del(bootstrap_key(secret))
            .await
            .context("take bootstrap credential")?;
        value
            .map(|bytes| serde_json::from_slice(&bytes).context("decode bootstrap grant"))
            .transpose()
            .map_err(AuthServiceError::from)
    }

    async fn revoke(&self, jti: Uuid, ttl_secs: u64) -> Result<(), AuthServiceError> {
        let mut conn = self.conn().await?;
        let (): () = conn
            .set_ex(revoked_key(jti), 1u8, ttl_secs.max(1))
            .await
            .context("store token revocation")?;
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, AuthServiceError> {
        let mut conn = self.conn().await?;
        let revoked: bool = conn
            .exists(revoked_key(jti))
            .await
            .context("check token revocation")?;
        Ok(revoked)
    }
}

/// Process-local cache for single-instance deployments without Redis.
#[derive(Clone, Default)]
pub struct MemorySessionCache {
    inner: Arc<Mutex<MemoryEntries>>,
}

#[derive(Default)]
struct MemoryEntries {
    bootstrap: HashMap<String, (BootstrapGrant, Instant)>,
    revoked: HashMap<Uuid, Instant>,
}

impl MemorySessionCache {
    fn entries(&self) -> Result<MutexGuard<'_, MemoryEntries>, AuthServiceError> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("session cache lock poisoned").into())
    }
}

impl SessionCache for MemorySessionCache {
    async fn put_bootstrap(
        &self,
        secret: &str,
        grant: &BootstrapGrant,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError> {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs);
        let mut entries = self.entries()?;
        let now = Instant::now();
        entries.bootstrap.retain(|_, (_, until)| *until > now);
        entries
            .bootstrap
            .insert(secret.to_owned(), (grant.clone(), deadline));
        Ok(())
    }

    async fn take_bootstrap(
        &self,
        secret: &str,
    ) -> Result<Option<BootstrapGrant>, AuthServiceError> {
        let taken = self.entries()?.bootstrap.remove(secret);
        Ok(taken
            .filter(|(_, until)| *until > Instant::now())
            .map(|(grant, _)| grant))
    }

    async fn revoke(&self, jti: Uuid, ttl_secs: u64) -> Result<(), AuthServiceError> {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs.max(1));
        let mut entries = self.entries()?;
        let now = Instant::now();
        entries.revoked.retain(|_, until| *until > now);
        entries.revoked.insert(jti, deadline);
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, AuthServiceError> {
        let entries = self.entries()?;
        Ok(entries
            .revoked
            .get(&jti)
            .is_some_and(|until| *until > Instant::now()))
    }
}

/// Session cache picked at startup: Redis when configured, process memory otherwise.
#[derive(Clone)]
pub enum SessionStore {
    Redis(RedisSessionCache),
    Memory(MemorySessionCache),
}

impl SessionStore {
    pub async fn ping(&self) -> Result<(), anyhow::Error> {
        match self {
            Self::Redis(cache) => {
                let mut conn = cache.pool.get().await?;
                let _: bool = conn.exists("readyz").await?;
                Ok(())
            }
            Self::Memory(_) => Ok(()),
        }
    }
}

impl SessionCache for SessionStore {
    async fn put_bootstrap(
        &self,
        secret: &str,
        grant: &BootstrapGrant,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError> {
        match self {
            Self::Redis(c) => c.put_bootstrap(secret, grant, ttl_secs).await,
            Self::Memory(c) => c.put_bootstrap(secret, grant, ttl_secs).await,
        }
    }

    async fn take_bootstrap(
        &self,
        secret: &str,
    ) -> Result<Option<BootstrapGrant>, AuthServiceError> {
        match self {
            Self::Redis(c) => c.take_bootstrap(secret).await,
            Self::Memory(c) => c.take_bootstrap(secret).await,
        }
    }

    async fn revoke(&self, jti: Uuid, ttl_secs: u64) -> Result<(), AuthServiceError> {
        match self {
            Self::Redis(c) => c.revoke(jti, ttl_secs).await,
            Self::Memory(c) => c.revoke(jti, ttl_secs).await,
        }
    }

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, AuthServiceError> {
        match self {
            Self::Redis(c) => c.is_revoked(jti).await,
            Self::Memory(c) => c.is_revoked(jti).await,
        }
    }
}
