//! API Gateway entry point.
//!
//! Boot order: tracing, settings, Redis connection manager, token
//! verifier, then the HTTP server with the authentication chain wrapped
//! around every route (outermost first: logging, JWT verification,
//! revocation check, session guard).

use actix_web::middleware::Condition;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use api_gateway::{config::Settings, routes};
use auth_core::JwtVerifier;
use gateway_middleware::{
    JwtAuthMiddleware, Logging, PublicPaths, SessionGuardMiddleware, TokenRevocationMiddleware,
};
use redis_utils::RedisPool;
use session_store::{RedisBackend, RevocationStore, SessionConfig, SessionStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "api_gateway=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting API Gateway");

    let settings = Settings::load().context("Failed to load configuration")?;

    let redis_pool = RedisPool::connect(&settings.redis.url)
        .await
        .context("Failed to connect to Redis")?;
    let backend = Arc::new(RedisBackend::new(
        redis_pool.manager(),
        Duration::from_millis(settings.redis.op_timeout_ms),
    ));

    let verifier = Arc::new(
        JwtVerifier::new(&settings.jwt.key_material(), settings.jwt.leeway_secs)
            .context("Failed to build JWT verifier")?,
    );

    let revocations = RevocationStore::new(backend.clone());
    let sessions = SessionStore::new(
        backend,
        SessionConfig {
            session_ttl: Duration::from_secs(settings.auth.session_ttl_secs),
            token_ttl: Duration::from_secs(settings.auth.token_ttl_secs),
        },
    );
    let public_paths = PublicPaths::new(settings.auth.public_paths.clone());
    let enforce_session = settings.auth.enforce_session;

    let bind_addr = (settings.server.host.clone(), settings.server.port);
    info!(
        host = %bind_addr.0,
        port = bind_addr.1,
        enforce_session,
        "Gateway listening"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(sessions.clone()))
            .app_data(web::Data::new(revocations.clone()))
            .wrap(Condition::new(
                enforce_session,
                SessionGuardMiddleware::new(sessions.clone(), public_paths.clone()),
            ))
            .wrap(TokenRevocationMiddleware::new(
                revocations.clone(),
                public_paths.clone(),
            ))
            .wrap(JwtAuthMiddleware::new(
                verifier.clone(),
                public_paths.clone(),
            ))
            .wrap(Logging)
            .configure(routes::configure)
    })
    .bind(bind_addr)
    .context("Failed to bind server address")?
    .run()
    .await
    .context("HTTP server terminated with error")
}
