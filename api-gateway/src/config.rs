//! Configuration management for the API Gateway
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)

use anyhow::{Context, Result};
use auth_core::KeyMaterial;
use std::env;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub redis: RedisSettings,
    pub jwt: JwtSettings,
    pub auth: AuthSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
        }

        Ok(Settings {
            server: ServerSettings::from_env()?,
            redis: RedisSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            auth: AuthSettings::from_env()?,
        })
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
        })
    }
}

/// Shared-store connection settings
#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub url: String,
    /// Bound on every store round trip; exceeding it counts as a store
    /// failure and follows the fail-open/fail-closed policy of the caller.
    pub op_timeout_ms: u64,
}

impl RedisSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("REDIS_URL").context("REDIS_URL must be set")?,
            op_timeout_ms: env::var("REDIS_OP_TIMEOUT_MS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .context("Invalid REDIS_OP_TIMEOUT_MS")?,
        })
    }
}

/// JWT verification settings
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: Option<String>,
    pub public_key_pem: Option<String>,
    pub leeway_secs: u64,
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET").ok();
        let public_key_pem = env::var("JWT_PUBLIC_KEY").ok();

        if secret.is_none() && public_key_pem.is_none() {
            anyhow::bail!("either JWT_PUBLIC_KEY or JWT_SECRET must be set");
        }

        Ok(Self {
            secret,
            public_key_pem,
            leeway_secs: env::var("JWT_LEEWAY_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid JWT_LEEWAY_SECS")?,
        })
    }

    /// Verification key material. An RSA public key takes precedence over a
    /// shared secret; the gateway never holds a signing key.
    pub fn key_material(&self) -> KeyMaterial {
        match (&self.public_key_pem, &self.secret) {
            (Some(public), _) => KeyMaterial::RsaPem {
                public: public.clone(),
                private: None,
            },
            (None, Some(secret)) => KeyMaterial::Secret(secret.clone()),
            (None, None) => unreachable!("validated in from_env"),
        }
    }
}

/// Authentication chain settings
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Sliding session window in seconds
    pub session_ttl_secs: u64,
    /// Token→subject lookup lifetime in seconds; matches token lifetime
    pub token_ttl_secs: u64,
    /// Whether the session-liveness step runs at all
    pub enforce_session: bool,
    /// Path prefixes exempt from the chain
    pub public_paths: Vec<String>,
}

impl AuthSettings {
    fn from_env() -> Result<Self> {
        let public_paths = match env::var("AUTH_PUBLIC_PATHS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => vec![
                "/auth/login".to_string(),
                "/auth/register".to_string(),
                "/health".to_string(),
                "/metrics".to_string(),
            ],
        };

        Ok(Self {
            session_ttl_secs: env::var("AUTH_SESSION_TTL_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()
                .context("Invalid AUTH_SESSION_TTL_SECS")?,
            token_ttl_secs: env::var("AUTH_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .context("Invalid AUTH_TOKEN_TTL_SECS")?,
            enforce_session: env::var("AUTH_ENFORCE_SESSION")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("Invalid AUTH_ENFORCE_SESSION")?,
            public_paths,
        })
    }
}
