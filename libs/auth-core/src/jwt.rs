//! JWT claims model, signing and verification.
//!
//! Verification is pure CPU work with no I/O, so it runs on the request's
//! own task. Supported algorithms are HS256 (shared secret) and RS256
//! (PEM-encoded RSA keys); verify-only services never hold a private key.

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Claims carried by Corebank access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (stable user identifier)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Role names granted to the subject
    #[serde(default)]
    pub roles: Vec<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Claims {
    /// Remaining validity of the token from now, clamped at zero.
    ///
    /// Used as the blacklist TTL on revocation so the entry self-expires no
    /// later than the token itself would have.
    pub fn remaining_validity(&self) -> Duration {
        let secs = self.exp - Utc::now().timestamp();
        Duration::from_secs(secs.max(0) as u64)
    }

    /// Comma-joined role list, the form propagated in identity headers.
    pub fn roles_joined(&self) -> String {
        self.roles.join(",")
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}

/// Key material for token signing and verification.
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    /// Shared HMAC secret (HS256, development/testing)
    Secret(String),
    /// PEM-encoded RSA keys (RS256); the private key is only present in
    /// services that issue tokens
    RsaPem {
        public: String,
        private: Option<String>,
    },
}

/// Stateless token verifier.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier from key material with the given clock-skew leeway.
    pub fn new(material: &KeyMaterial, leeway_secs: u64) -> Result<Self, AuthError> {
        let (key, algorithm) = match material {
            KeyMaterial::Secret(secret) => {
                (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
            KeyMaterial::RsaPem { public, .. } => (
                DecodingKey::from_rsa_pem(public.as_bytes())
                    .map_err(|e| AuthError::InvalidKey(e.to_string()))?,
                Algorithm::RS256,
            ),
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = leeway_secs;
        validation.validate_exp = true;

        Ok(Self { key, validation })
    }

    /// Verify signature and expiration, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}

/// Token issuer used by login flows and tests.
pub struct JwtSigner {
    key: EncodingKey,
    header: Header,
    token_ttl: ChronoDuration,
}

impl JwtSigner {
    pub fn new(material: &KeyMaterial, token_ttl_secs: i64) -> Result<Self, AuthError> {
        let (key, algorithm) = match material {
            KeyMaterial::Secret(secret) => {
                (EncodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
            KeyMaterial::RsaPem {
                private: Some(private),
                ..
            } => (
                EncodingKey::from_rsa_pem(private.as_bytes())
                    .map_err(|e| AuthError::InvalidKey(e.to_string()))?,
                Algorithm::RS256,
            ),
            KeyMaterial::RsaPem { private: None, .. } => {
                return Err(AuthError::InvalidKey(
                    "signing requires an RSA private key".into(),
                ));
            }
        };

        Ok(Self {
            key,
            header: Header::new(algorithm),
            token_ttl: ChronoDuration::seconds(token_ttl_secs),
        })
    }

    /// Generate a signed token for `subject`.
    pub fn generate(
        &self,
        subject: &str,
        email: Option<&str>,
        name: Option<&str>,
        roles: &[String],
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
            roles: roles.to_vec(),
            email: email.map(str::to_string),
            name: name.map(str::to_string),
        };

        encode(&self.header, &claims, &self.key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
