//! Request handlers served directly by the gateway.

use crate::error::{GatewayError, Result};
use actix_web::{web, HttpResponse};
use gateway_middleware::AuthenticatedUser;
use session_store::{RevocationStore, SessionStore};
use tracing::{error, info};

/// Liveness probe. Public path.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

/// Prometheus exposition. Public path.
pub async fn metrics() -> HttpResponse {
    let encoder = prometheus::TextEncoder::new();
    match encoder.encode_to_string(&prometheus::gather()) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Logout: one logical operation — drop the session record and token
/// lookup, then blacklist the token for its remaining validity so replay
/// is blocked even if cleanup partially failed.
pub async fn logout(
    user: AuthenticatedUser,
    sessions: web::Data<SessionStore>,
    revocations: web::Data<RevocationStore>,
) -> Result<HttpResponse> {
    sessions
        .invalidate(
            &user.subject,
            &user.token,
            &revocations,
            user.remaining_validity(),
        )
        .await?;

    info!(subject = %user.subject, "User logged out");
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "Logged out"})))
}

/// Session introspection for the calling user.
pub async fn my_session(
    user: AuthenticatedUser,
    sessions: web::Data<SessionStore>,
) -> Result<HttpResponse> {
    match sessions.get(&user.subject).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Err(GatewayError::SessionNotFound),
    }
}
