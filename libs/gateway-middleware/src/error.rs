use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Terminal rejection produced by the authentication chain.
///
/// Rejections are not retried within a request. The response body carries
/// only a compact reason code; which store or step failed stays in logs and
/// metrics.
#[derive(Debug, Clone, Error)]
pub enum AuthRejection {
    #[error("Missing or invalid Authorization header")]
    MalformedRequest,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid session")]
    IdentityMismatch,

    #[error("Session unavailable")]
    SessionStoreUnavailable,

    #[error("Internal authentication error")]
    Internal,
}

#[derive(Serialize)]
struct RejectionBody<'a> {
    error: &'a str,
}

impl AuthRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            AuthRejection::MalformedRequest => "malformed_request",
            AuthRejection::InvalidToken => "invalid_token",
            AuthRejection::Revoked => "revoked",
            AuthRejection::SessionExpired => "session_expired",
            AuthRejection::IdentityMismatch => "identity_mismatch",
            AuthRejection::SessionStoreUnavailable => "session_unavailable",
            AuthRejection::Internal => "internal",
        }
    }

    /// Record the rejection and convert it into an actix error.
    pub fn reject(self) -> actix_web::Error {
        crate::metrics::AUTH_REJECTIONS_TOTAL
            .with_label_values(&[self.reason()])
            .inc();
        self.into()
    }
}

impl ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthRejection::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(RejectionBody {
            error: self.reason(),
        })
    }
}
