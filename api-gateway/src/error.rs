use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use session_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Store error: {}", err);
        GatewayError::Store(err.to_string())
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::SessionNotFound => StatusCode::NOT_FOUND,
            GatewayError::Store(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Don't leak internal details to the caller
        let message = match self {
            GatewayError::SessionNotFound => "session_not_found",
            GatewayError::Store(_) | GatewayError::Internal(_) => "internal",
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { error: message })
    }
}
