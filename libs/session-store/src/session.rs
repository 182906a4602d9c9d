//! Sliding-window session records.
//!
//! One record per subject: a new login overwrites the previous record
//! (last write wins). A separate token→subject lookup entry, keyed by token
//! digest, validates that a presented token still belongs to a live login
//! and exposes subject/token mismatches.
//!
//! Records are informational and operational (session introspection,
//! forced logout). Identity always comes from verified token claims, never
//! from a record.

use crate::backend::KvBackend;
use crate::error::StoreError;
use crate::revocation::RevocationStore;
use auth_core::token_digest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const SESSION_PREFIX: &str = "corebank:session:";
const TOKEN_PREFIX: &str = "corebank:token:";

/// Client metadata captured at login.
///
/// Fixed, explicitly typed structure. New metadata becomes an optional
/// field here rather than a free-form attribute map, so serialized records
/// stay stable across service versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientContext {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Session record stored per subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub subject: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Token issued at login. A concurrent login may leave this stale;
    /// the record is never an authorization source, so that is acceptable.
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    #[serde(default)]
    pub client: ClientContext,
}

impl SessionRecord {
    pub fn new(subject: impl Into<String>, token: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            subject: subject.into(),
            name: None,
            roles: Vec::new(),
            token: token.into(),
            created_at: now,
            last_accessed_at: now,
            client: ClientContext::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sliding window applied to session records.
    pub session_ttl: Duration,
    /// Lifetime of the token→subject lookup entry; matches token lifetime.
    pub token_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(30 * 60),
            token_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KvBackend>,
    config: SessionConfig,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KvBackend>, config: SessionConfig) -> Self {
        Self { backend, config }
    }

    fn session_key(subject: &str) -> String {
        format!("{}{}", SESSION_PREFIX, subject)
    }

    fn token_key(token: &str) -> String {
        format!("{}{}", TOKEN_PREFIX, token_digest(token))
    }

    /// Write the record under the session TTL and the token→subject lookup
    /// under the token TTL.
    pub async fn create(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let payload = serde_json::to_string(record)?;
        self.backend
            .set_ex(
                &Self::session_key(&record.subject),
                &payload,
                self.config.session_ttl,
            )
            .await?;
        self.backend
            .set_ex(
                &Self::token_key(&record.token),
                &record.subject,
                self.config.token_ttl,
            )
            .await?;

        info!(subject = %record.subject, ttl = ?self.config.session_ttl, "Created session");
        Ok(())
    }

    pub async fn get(&self, subject: &str) -> Result<Option<SessionRecord>, StoreError> {
        match self.backend.get(&Self::session_key(subject)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Resolve the subject a token was issued to, if that login is still
    /// live.
    pub async fn lookup_subject(&self, token: &str) -> Result<Option<String>, StoreError> {
        self.backend.get(&Self::token_key(token)).await
    }

    /// Sliding-window refresh: bump `last_accessed_at` and rewrite with the
    /// full session TTL. Returns `Ok(false)` when no record exists; the
    /// caller decides whether that is a rejection.
    pub async fn refresh(&self, subject: &str) -> Result<bool, StoreError> {
        let Some(mut record) = self.get(subject).await? else {
            return Ok(false);
        };

        record.last_accessed_at = Utc::now();
        let payload = serde_json::to_string(&record)?;
        self.backend
            .set_ex(
                &Self::session_key(subject),
                &payload,
                self.config.session_ttl,
            )
            .await?;

        debug!(subject = %subject, "Refreshed session");
        Ok(true)
    }

    /// Single logical logout: delete the session and lookup entries, then
    /// ALWAYS attempt revocation, so token replay stays blocked even when
    /// record cleanup partially fails.
    pub async fn invalidate(
        &self,
        subject: &str,
        token: &str,
        revocations: &RevocationStore,
        token_remaining: Duration,
    ) -> Result<(), StoreError> {
        let session_del = self.backend.del(&Self::session_key(subject)).await;
        let token_del = self.backend.del(&Self::token_key(token)).await;

        if let Err(e) = &session_del {
            warn!(subject = %subject, error = %e, "Failed to delete session record during logout");
        }
        if let Err(e) = &token_del {
            warn!(subject = %subject, error = %e, "Failed to delete token lookup during logout");
        }

        revocations.revoke(token, token_remaining).await?;
        session_del?;
        token_del?;

        info!(subject = %subject, "Invalidated session");
        Ok(())
    }
}
