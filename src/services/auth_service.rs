use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, warn};

use crate::db::models::User;
use crate::server::config::ServerConfig;
use crate::web::error::AppError;
use crate::web::models::{AuthenticatedUser, Claims};

/// Lifetime of a session token and of the cookie carrying it.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Hashes passwords and issues/validates HS256 session tokens.
/// Built once from the loaded configuration; the secret never changes afterwards.
#[derive(Clone)]
pub struct CredentialService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    hash_cost: u32,
}

impl CredentialService {
    pub fn new(jwt_secret: &str, hash_cost: u32) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "iat"]);

        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
            hash_cost,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.jwt_secret, config.bcrypt_cost)
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.hash_cost)
            .map_err(|e| AppError::PasswordHashingError(e.to_string()))
    }

    /// Returns `false` on mismatch and on a malformed hash; never errors.
    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        match verify(password, password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "Stored password hash could not be verified.");
                false
            }
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::days(SESSION_TTL_DAYS);

        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
            nbf: now.timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::TokenCreationError(e.to_string()))
    }

    /// Any failure (bad signature, other algorithm, expired, not yet valid,
    /// malformed) collapses into `AppError::InvalidToken`.
    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(error = ?e, "Session token rejected.");
            AppError::InvalidToken
        })?;

        Ok(AuthenticatedUser {
            id: token_data.claims.user_id,
            email: token_data.claims.email,
            name: token_data.claims.name,
        })
    }
}
