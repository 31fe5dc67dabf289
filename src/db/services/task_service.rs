use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::error::StoreError;
use crate::db::models::{NewTask, Task, TaskPatch, TaskRow};
use crate::db::update::build_update;

// --- Task Service Functions ---

fn into_tasks(rows: Vec<TaskRow>) -> Result<Vec<Task>, StoreError> {
    rows.into_iter().map(Task::try_from).collect()
}

/// Whether a category exists and belongs to the user.
pub async fn category_belongs_to_user(
    pool: &PgPool,
    category_id: Uuid,
    user_id: Uuid,
) -> Result<bool, StoreError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND user_id = $2)",
    )
    .bind(category_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Creates a task. The row is only inserted when the category belongs to the
/// same user; otherwise `None` is returned.
pub async fn create_task(
    pool: &PgPool,
    user_id: Uuid,
    input: NewTask,
) -> Result<Option<Task>, StoreError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, TaskRow>(
        r#"
        INSERT INTO tasks (user_id, category_id, title, description, status, priority, due_date, tags, created_at, updated_at)
        SELECT $1, c.id, $3, $4, $5, $6, $7, $8, $9, $9
        FROM categories c
        WHERE c.id = $2 AND c.user_id = $1
        RETURNING id, user_id, category_id, title, description, status, priority, due_date, tags, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(input.category_id)
    .bind(input.title)
    .bind(input.description)
    .bind(input.status.as_str())
    .bind(input.priority.as_str())
    .bind(input.due_date)
    .bind(input.tags)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    row.map(Task::try_from).transpose()
}

/// Retrieves a task owned by the given user.
pub async fn get_task(
    pool: &PgPool,
    task_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Task>, StoreError> {
    let row = sqlx::query_as::<_, TaskRow>(
        r#"
        SELECT id, user_id, category_id, title, description, status, priority, due_date, tags, created_at, updated_at
        FROM tasks
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(Task::try_from).transpose()
}

/// Retrieves all tasks of a user, newest first.
pub async fn get_tasks_by_user_id(pool: &PgPool, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
    let rows = sqlx::query_as::<_, TaskRow>(
        r#"
        SELECT id, user_id, category_id, title, description, status, priority, due_date, tags, created_at, updated_at
        FROM tasks
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    into_tasks(rows)
}

/// Retrieves the user's tasks filed under one category, newest first.
pub async fn get_tasks_in_category(
    pool: &PgPool,
    category_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Task>, StoreError> {
    let rows = sqlx::query_as::<_, TaskRow>(
        r#"
        SELECT id, user_id, category_id, title, description, status, priority, due_date, tags, created_at, updated_at
        FROM tasks
        WHERE category_id = $1 AND user_id = $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(category_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    into_tasks(rows)
}

/// Applies a partial update to a task owned by the user.
pub async fn update_task(
    pool: &PgPool,
    task_id: Uuid,
    user_id: Uuid, // for authorization
    patch: TaskPatch,
) -> Result<Option<Task>, StoreError> {
    let mut builder = build_update("tasks", patch.into_assignments(), Utc::now());
    builder.push(" WHERE id = ");
    builder.push_bind(task_id);
    builder.push(" AND user_id = ");
    builder.push_bind(user_id);
    builder.push(
        " RETURNING id, user_id, category_id, title, description, status, priority, due_date, tags, created_at, updated_at",
    );

    let row = builder
        .build_query_as::<TaskRow>()
        .fetch_optional(pool)
        .await?;

    row.map(Task::try_from).transpose()
}

/// Deletes a task. Returns the number of rows affected.
pub async fn delete_task(pool: &PgPool, task_id: Uuid, user_id: Uuid) -> Result<u64, StoreError> {
    let rows_affected = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows_affected)
}
