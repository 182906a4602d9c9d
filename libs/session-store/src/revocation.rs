//! Hashed-token blacklist.
//!
//! Stateless JWT authentication with token revocation: the token carries all
//! identity, Redis only records the digests of tokens that were explicitly
//! logged out. One EXISTS per request, and entries expire with the token
//! they guard, so the blacklist never grows past the set of live logouts.

use crate::backend::KvBackend;
use crate::error::StoreError;
use auth_core::token_digest;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const BLACKLIST_PREFIX: &str = "corebank:blacklist:";

#[derive(Clone)]
pub struct RevocationStore {
    backend: Arc<dyn KvBackend>,
}

impl RevocationStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    fn key(token: &str) -> String {
        format!("{}{}", BLACKLIST_PREFIX, token_digest(token))
    }

    /// Revoke `token` for `ttl` (its remaining validity). Idempotent:
    /// revoking an already-revoked token rewrites the same marker.
    pub async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), StoreError> {
        if ttl.is_zero() {
            // Token already expired naturally; nothing left to block.
            debug!("Skipping blacklist write for expired token");
            return Ok(());
        }

        let key = Self::key(token);
        self.backend.set_ex(&key, "1", ttl).await?;
        info!(token_hash = %&key[BLACKLIST_PREFIX.len()..], "Token added to blacklist");
        Ok(())
    }

    /// Single existence check against the blacklist.
    pub async fn is_revoked(&self, token: &str) -> Result<bool, StoreError> {
        self.backend.exists(&Self::key(token)).await
    }

    /// Remove a blacklist entry (administrative clear).
    pub async fn clear(&self, token: &str) -> Result<(), StoreError> {
        self.backend.del(&Self::key(token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn store() -> (RevocationStore, MemoryBackend) {
        let backend = MemoryBackend::new();
        (RevocationStore::new(Arc::new(backend.clone())), backend)
    }

    #[tokio::test]
    async fn test_revoke_then_is_revoked() {
        let (store, _) = store();
        store
            .revoke("token-1", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(store.is_revoked("token-1").await.unwrap());
        assert!(!store.is_revoked("token-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (store, _) = store();
        store
            .revoke("token-1", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .revoke("token-1", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(store.is_revoked("token-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_expired_token_is_noop() {
        let (store, _) = store();
        store.revoke("token-1", Duration::ZERO).await.unwrap();
        assert!(!store.is_revoked("token-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_entry_expires_with_ttl() {
        let (store, _) = store();
        store
            .revoke("token-1", Duration::from_millis(50))
            .await
            .unwrap();
        assert!(store.is_revoked("token-1").await.unwrap());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!store.is_revoked("token-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_removes_entry() {
        let (store, _) = store();
        store
            .revoke("token-1", Duration::from_secs(60))
            .await
            .unwrap();
        store.clear("token-1").await.unwrap();
        assert!(!store.is_revoked("token-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_unavailable_backend_surfaces_error() {
        let (store, backend) = store();
        backend.set_available(false);
        assert!(matches!(
            store.is_revoked("token-1").await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
