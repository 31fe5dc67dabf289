use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    HasDependents(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Maps a failed write to `AlreadyExists` when Postgres reports a unique violation.
    pub fn on_unique_violation(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(database_error) = &err {
            if database_error.is_unique_violation() {
                return StoreError::AlreadyExists(message.to_string());
            }
        }
        StoreError::Database(err)
    }
}

pub const CATEGORY_EXISTS: &str = "category with this name already exists";
pub const EMAIL_EXISTS: &str = "a user with this email already exists";
pub const CATEGORY_IN_USE: &str = "cannot delete category with associated tasks";
