use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::error::{EMAIL_EXISTS, StoreError};
use crate::db::models::{User, UserPatch};
use crate::db::update::build_update;

// --- User Service Functions ---

/// Creates a new user. A duplicate email surfaces as `AlreadyExists`.
pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, StoreError> {
    let now = Utc::now();
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING id, name, email, password_hash, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| StoreError::on_unique_violation(e, EMAIL_EXISTS))
}

/// Retrieves a user by their ID.
pub async fn get_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Retrieves a user by their email.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, created_at, updated_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Updates the name and/or email of a user.
pub async fn update_user(
    pool: &PgPool,
    user_id: Uuid,
    patch: UserPatch,
) -> Result<Option<User>, StoreError> {
    let mut builder = build_update("users", patch.into_assignments(), Utc::now());
    builder.push(" WHERE id = ");
    builder.push_bind(user_id);
    builder.push(" RETURNING id, name, email, password_hash, created_at, updated_at");

    builder
        .build_query_as::<User>()
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::on_unique_violation(e, EMAIL_EXISTS))
}

/// Replaces the stored password hash. Returns the number of rows affected.
pub async fn update_user_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<u64, StoreError> {
    let rows_affected = sqlx::query(
        "UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3",
    )
    .bind(password_hash)
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows_affected)
}
