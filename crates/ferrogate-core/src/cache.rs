//! Token revocation cache.
//!
//! The cache answers "is this subject's token still admitted for this
//! tenant", independent of token expiry. A token absent from the cache
//! is one that has not been re-admitted since the last forced global
//! invalidation, so the gateway fails closed on a miss. The null
//! implementation degrades the whole feature to a no-op for
//! deployments without a cache backend.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::FerrogateError;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl From<CacheError> for FerrogateError {
    fn from(err: CacheError) -> Self {
        FerrogateError::Cache(err.to_string())
    }
}

/// Process-visible cache mapping (tenant, subject) to the admitted
/// token. Shared across all concurrent requests; implementations must
/// be safe under concurrent reads with no per-request lock.
pub trait RevocationCache: Send + Sync {
    /// Whether a token is currently admitted for this subject.
    fn admitted(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = Result<bool, CacheError>> + Send;

    /// Admit a freshly issued token for this subject.
    fn admit(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        token: String,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Drop the subject's admission (forced re-login).
    fn evict(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;
}

// The cache is process-wide shared state, so consumers usually hold
// it behind an Arc.
impl<T: RevocationCache> RevocationCache for std::sync::Arc<T> {
    async fn admitted(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, CacheError> {
        (**self).admitted(tenant_id, id).await
    }

    async fn admit(&self, tenant_id: Uuid, id: Uuid, token: String) -> Result<(), CacheError> {
        (**self).admit(tenant_id, id, token).await
    }

    async fn evict(&self, tenant_id: Uuid, id: Uuid) -> Result<(), CacheError> {
        (**self).evict(tenant_id, id).await
    }
}

/// No-op cache: every subject always reports as admitted, so the
/// gateway's revocation check degrades to a pass-through.
#[derive(Debug, Clone, Default)]
pub struct NullCache;

impl RevocationCache for NullCache {
    async fn admitted(&self, _tenant_id: Uuid, _id: Uuid) -> Result<bool, CacheError> {
        Ok(true)
    }

    async fn admit(&self, _tenant_id: Uuid, _id: Uuid, _token: String) -> Result<(), CacheError> {
        Ok(())
    }

    async fn evict(&self, _tenant_id: Uuid, _id: Uuid) -> Result<(), CacheError> {
        Ok(())
    }
}

/// In-process cache backed by a read/write-locked map. Suitable for a
/// single-process deployment and for tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<(Uuid, Uuid), String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevocationCache for MemoryCache {
    async fn admitted(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, CacheError> {
        Ok(self.entries.read().await.contains_key(&(tenant_id, id)))
    }

    async fn admit(&self, tenant_id: Uuid, id: Uuid, token: String) -> Result<(), CacheError> {
        self.entries.write().await.insert((tenant_id, id), token);
        Ok(())
    }

    async fn evict(&self, tenant_id: Uuid, id: Uuid) -> Result<(), CacheError> {
        self.entries.write().await.remove(&(tenant_id, id));
        Ok(())
    }
}
