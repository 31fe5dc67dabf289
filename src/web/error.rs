use async_graphql::ErrorExtensions;
use thiserror::Error;
use tracing::error;

use crate::db::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    HasDependents(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("Password hashing failed: {0}")]
    PasswordHashingError(String),
    #[error("JWT creation failed: {0}")]
    TokenCreationError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AuthenticationRequired | AppError::InvalidToken => "UNAUTHENTICATED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyExists(_) => "ALREADY_EXISTS",
            AppError::HasDependents(_) => "HAS_DEPENDENTS",
            AppError::InvalidInput(_) => "BAD_USER_INPUT",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::PasswordHashingError(_)
            | AppError::TokenCreationError(_)
            | AppError::DatabaseError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn is_internal(&self) -> bool {
        self.code() == "INTERNAL_SERVER_ERROR"
    }
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        let message = if self.is_internal() {
            error!(error = %self, "Request failed with an internal error.");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        async_graphql::Error::new(message).extend_with(|_, e| e.set("code", self.code()))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => AppError::NotFound(format!("{} not found", entity.to_lowercase())),
            StoreError::AlreadyExists(msg) => AppError::AlreadyExists(msg),
            StoreError::HasDependents(msg) => AppError::HasDependents(msg),
            StoreError::InvalidInput(msg) => AppError::InvalidInput(msg),
            StoreError::Database(e) => AppError::DatabaseError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_codes() {
        let not_found: AppError = StoreError::NotFound("Task").into();
        assert_eq!(not_found.code(), "NOT_FOUND");
        assert_eq!(not_found.to_string(), "task not found");

        let exists: AppError = StoreError::AlreadyExists("dup".to_string()).into();
        assert_eq!(exists.code(), "ALREADY_EXISTS");

        let db: AppError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(db.code(), "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn test_invalid_token_reads_as_unauthenticated() {
        assert_eq!(AppError::InvalidToken.code(), "UNAUTHENTICATED");
        assert_eq!(AppError::InvalidToken.code(), AppError::AuthenticationRequired.code());
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::DatabaseError("connection refused at 10.0.0.3".to_string());
        let gql = err.extend();
        assert_eq!(gql.message, "internal server error");
    }
}
