//! The `Store` trait is the data-access contract shared by the Postgres
//! backend and the in-memory backend.
//!
//! Every task and category accessor takes the acting user's id. A row owned
//! by somebody else is reported as `StoreError::NotFound`, exactly as if it
//! did not exist.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::error::StoreError;
use crate::db::models::{Category, NewTask, Task, TaskPatch, TaskStatus, User, UserPatch};

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // --- Users ---

    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> StoreResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> StoreResult<User>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User>;

    async fn update_user(&self, user_id: Uuid, patch: UserPatch) -> StoreResult<User>;

    async fn update_user_password(&self, user_id: Uuid, password_hash: &str) -> StoreResult<()>;

    // --- Categories ---

    async fn create_category(&self, user_id: Uuid, name: &str) -> StoreResult<Category>;

    async fn get_category(&self, category_id: Uuid, user_id: Uuid) -> StoreResult<Category>;

    /// Categories of a user ordered by name.
    async fn list_categories(&self, user_id: Uuid) -> StoreResult<Vec<Category>>;

    async fn update_category(
        &self,
        category_id: Uuid,
        user_id: Uuid,
        name: &str,
    ) -> StoreResult<Category>;

    /// Refuses with `HasDependents` while any task references the category.
    async fn delete_category(&self, category_id: Uuid, user_id: Uuid) -> StoreResult<()>;

    /// Number of the user's tasks filed under the category.
    async fn count_tasks_in_category(&self, category_id: Uuid, user_id: Uuid) -> StoreResult<i64>;

    // --- Tasks ---

    async fn create_task(&self, user_id: Uuid, input: NewTask) -> StoreResult<Task>;

    async fn get_task(&self, task_id: Uuid, user_id: Uuid) -> StoreResult<Task>;

    /// Tasks of a user, newest first.
    async fn list_tasks(&self, user_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn list_tasks_in_category(
        &self,
        category_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Vec<Task>>;

    /// Applies only the fields present in `patch`; `updated_at` is always refreshed.
    async fn update_task(&self, task_id: Uuid, user_id: Uuid, patch: TaskPatch) -> StoreResult<Task>;

    async fn update_task_status(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        status: TaskStatus,
    ) -> StoreResult<Task> {
        let patch = TaskPatch {
            status: Some(status),
            ..Default::default()
        };
        self.update_task(task_id, user_id, patch).await
    }

    async fn delete_task(&self, task_id: Uuid, user_id: Uuid) -> StoreResult<()>;
}
