use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::CartNotFound => AppError::Internal(e.to_string()),
            DomainError::InvalidProduct(_) | DomainError::InvalidQuantity(_) => {
                AppError::BadRequest(e.to_string())
            }
            DomainError::Storage(msg) | DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": msg
            })),
            AppError::Internal(_) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            })),
        }
    }
}

/// Failures while wiring up storage at start-up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database pool: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("database migrations: {0}")]
    Migrations(String),
}
