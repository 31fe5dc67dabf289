use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::error::{CATEGORY_EXISTS, CATEGORY_IN_USE, StoreError};
use crate::db::models::Category;

// --- Category Service Functions ---

/// Creates a new category for a user. Names are unique per user.
pub async fn create_category(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
) -> Result<Category, StoreError> {
    let now = Utc::now();
    sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (user_id, name, created_at, updated_at)
        VALUES ($1, $2, $3, $3)
        RETURNING id, user_id, name, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| StoreError::on_unique_violation(e, CATEGORY_EXISTS))
}

/// Retrieves a category owned by the given user.
pub async fn get_category(
    pool: &PgPool,
    category_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Category>, StoreError> {
    let category = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, user_id, name, created_at, updated_at
        FROM categories
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(category_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

/// Retrieves all categories of a user ordered by name.
pub async fn get_categories_by_user_id(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Category>, StoreError> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, user_id, name, created_at, updated_at
        FROM categories
        WHERE user_id = $1
        ORDER BY name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

/// Renames a category.
pub async fn update_category(
    pool: &PgPool,
    category_id: Uuid,
    user_id: Uuid, // for authorization
    name: &str,
) -> Result<Option<Category>, StoreError> {
    sqlx::query_as::<_, Category>(
        r#"
        UPDATE categories
        SET name = $1, updated_at = $2
        WHERE id = $3 AND user_id = $4
        RETURNING id, user_id, name, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(Utc::now())
    .bind(category_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StoreError::on_unique_violation(e, CATEGORY_EXISTS))
}

/// Counts the user's tasks filed under a category.
pub async fn count_tasks_in_category(
    pool: &PgPool,
    category_id: Uuid,
    user_id: Uuid,
) -> Result<i64, StoreError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks WHERE category_id = $1 AND user_id = $2",
    )
    .bind(category_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Deletes a category. Returns the number of rows affected.
///
/// The dependent-task check and the delete are separate statements. The
/// `ON DELETE RESTRICT` foreign key on `tasks.category_id` catches a task
/// inserted in between, which is reported as `HasDependents` as well.
pub async fn delete_category(
    pool: &PgPool,
    category_id: Uuid,
    user_id: Uuid,
) -> Result<u64, StoreError> {
    if count_tasks_in_category(pool, category_id, user_id).await? > 0 {
        return Err(StoreError::HasDependents(CATEGORY_IN_USE.to_string()));
    }

    let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
        .bind(category_id)
        .bind(user_id)
        .execute(pool)
        .await;

    match result {
        Ok(done) => Ok(done.rows_affected()),
        Err(sqlx::Error::Database(database_error))
            if database_error.is_foreign_key_violation() =>
        {
            Err(StoreError::HasDependents(CATEGORY_IN_USE.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
