//! Verified identity and its propagation to downstream services.

use actix_web::dev::ServiceRequest;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use auth_core::Claims;
use chrono::Utc;
use futures::future::{ready, Ready};
use std::time::Duration;

pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_USER_EMAIL: &str = "x-user-email";
pub const HEADER_USER_NAME: &str = "x-user-name";
pub const HEADER_USER_ROLES: &str = "x-user-roles";
pub const HEADER_TOKEN: &str = "x-token";

const IDENTITY_HEADERS: [&str; 5] = [
    HEADER_USER_ID,
    HEADER_USER_EMAIL,
    HEADER_USER_NAME,
    HEADER_USER_ROLES,
    HEADER_TOKEN,
];

/// Identity bound to a request after JWT verification.
///
/// Derived exclusively from verified token claims. The session record is
/// never consulted when building this.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub roles: Vec<String>,
    /// Raw token, forwarded so downstream services can drive their own
    /// logout/revocation calls without re-deriving it.
    pub token: String,
    /// Expiration claim (Unix timestamp).
    pub expires_at: i64,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: &Claims, token: &str) -> Self {
        Self {
            subject: claims.sub.clone(),
            email: claims.email.clone(),
            name: claims.name.clone(),
            roles: claims.roles.clone(),
            token: token.to_string(),
            expires_at: claims.exp,
        }
    }

    pub fn roles_joined(&self) -> String {
        self.roles.join(",")
    }

    /// Remaining token validity, clamped at zero. Used as the blacklist TTL
    /// on logout.
    pub fn remaining_validity(&self) -> Duration {
        let secs = self.expires_at - Utc::now().timestamp();
        Duration::from_secs(secs.max(0) as u64)
    }
}

/// Replace identity headers on the request with values from verified claims.
///
/// Inbound copies of these headers are always stripped first, so a client
/// can never smuggle its own identity past the gateway.
pub fn propagate_identity(req: &mut ServiceRequest, user: &AuthenticatedUser) {
    for name in IDENTITY_HEADERS {
        req.headers_mut().remove(name);
    }

    set_header(req, HEADER_USER_ID, &user.subject);
    if let Some(email) = &user.email {
        set_header(req, HEADER_USER_EMAIL, email);
    }
    if let Some(name) = &user.name {
        set_header(req, HEADER_USER_NAME, name);
    }
    set_header(req, HEADER_USER_ROLES, &user.roles_joined());
    set_header(req, HEADER_TOKEN, &user.token);
}

fn set_header(req: &mut ServiceRequest, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            req.headers_mut().insert(HeaderName::from_static(name), value);
        }
        Err(_) => {
            tracing::warn!(header = name, "Skipping identity header with non-ASCII value");
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(actix_web::error::ErrorUnauthorized(
                "User not authenticated",
            ))),
        }
    }
}
