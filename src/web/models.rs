use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::web::error::AppError;

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub exp: usize, // Expiration time (timestamp)
    pub iat: usize,
    pub nbf: usize,
}

/// Identity recovered from a valid session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Per-request identity, attached by the session middleware and handed to
/// the resolvers. Absence of a valid token yields `Anonymous`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestIdentity {
    #[default]
    Anonymous,
    Authenticated(AuthenticatedUser),
}

impl RequestIdentity {
    pub fn require(&self) -> Result<&AuthenticatedUser, AppError> {
        match self {
            RequestIdentity::Authenticated(user) => Ok(user),
            RequestIdentity::Anonymous => Err(AppError::AuthenticationRequired),
        }
    }
}
