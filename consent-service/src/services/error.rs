use crate::models::InvalidTransition;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Unauthorized: parent email mismatch")]
    ParentEmailMismatch,

    #[error("Invalid or expired confirmation code")]
    InvalidConfirmationCode,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Record was modified concurrently")]
    VersionConflict,

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::ValidationError(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::ParentEmailMismatch => {
                AppError::Forbidden(anyhow::anyhow!("Unauthorized: parent email mismatch"))
            }
            ServiceError::InvalidConfirmationCode => AppError::Forbidden(anyhow::anyhow!(
                "Invalid or expired confirmation code"
            )),
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::VersionConflict => AppError::Conflict(anyhow::anyhow!(
                "Record was modified concurrently, retry the request"
            )),
            ServiceError::InvalidTransition(e) => AppError::Conflict(anyhow::anyhow!(e.to_string())),
        }
    }
}
