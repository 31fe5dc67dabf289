use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use uuid::Uuid;

use crate::db::error::StoreError;
use crate::db::models::{Category, NewTask, Task, TaskPatch, User, UserPatch};
use crate::db::services;
use crate::db::store::{Store, StoreResult};
use crate::server::config::ServerConfig;

/// Opens the connection pool with the configured bounds.
pub async fn connect(config: &ServerConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .idle_timeout(config.db_idle_timeout)
        .max_lifetime(config.db_max_lifetime)
        .connect(&config.database_url)
        .await?;
    info!(
        max_connections = config.db_max_connections,
        "Database connection pool established."
    );
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied.");
    Ok(())
}

/// `Store` backed by Postgres. Concurrency is left to the pool and the database.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> StoreResult<User> {
        services::create_user(&self.pool, name, email, password_hash).await
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> StoreResult<User> {
        services::get_user_by_id(&self.pool, user_id)
            .await?
            .ok_or(StoreError::NotFound("User"))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        services::get_user_by_email(&self.pool, email)
            .await?
            .ok_or(StoreError::NotFound("User"))
    }

    async fn update_user(&self, user_id: Uuid, patch: UserPatch) -> StoreResult<User> {
        services::update_user(&self.pool, user_id, patch)
            .await?
            .ok_or(StoreError::NotFound("User"))
    }

    async fn update_user_password(&self, user_id: Uuid, password_hash: &str) -> StoreResult<()> {
        match services::update_user_password(&self.pool, user_id, password_hash).await? {
            0 => Err(StoreError::NotFound("User")),
            _ => Ok(()),
        }
    }

    async fn create_category(&self, user_id: Uuid, name: &str) -> StoreResult<Category> {
        services::create_category(&self.pool, user_id, name).await
    }

    async fn get_category(&self, category_id: Uuid, user_id: Uuid) -> StoreResult<Category> {
        services::get_category(&self.pool, category_id, user_id)
            .await?
            .ok_or(StoreError::NotFound("Category"))
    }

    async fn list_categories(&self, user_id: Uuid) -> StoreResult<Vec<Category>> {
        services::get_categories_by_user_id(&self.pool, user_id).await
    }

    async fn update_category(
        &self,
        category_id: Uuid,
        user_id: Uuid,
        name: &str,
    ) -> StoreResult<Category> {
        services::update_category(&self.pool, category_id, user_id, name)
            .await?
            .ok_or(StoreError::NotFound("Category"))
    }

    async fn delete_category(&self, category_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        match services::delete_category(&self.pool, category_id, user_id).await? {
            0 => Err(StoreError::NotFound("Category")),
            _ => Ok(()),
        }
    }

    async fn count_tasks_in_category(&self, category_id: Uuid, user_id: Uuid) -> StoreResult<i64> {
        services::count_tasks_in_category(&self.pool, category_id, user_id).await
    }

    async fn create_task(&self, user_id: Uuid, input: NewTask) -> StoreResult<Task> {
        services::create_task(&self.pool, user_id, input)
            .await?
            .ok_or(StoreError::NotFound("Category"))
    }

    async fn get_task(&self, task_id: Uuid, user_id: Uuid) -> StoreResult<Task> {
        services::get_task(&self.pool, task_id, user_id)
            .await?
            .ok_or(StoreError::NotFound("Task"))
    }

    async fn list_tasks(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        services::get_tasks_by_user_id(&self.pool, user_id).await
    }

    async fn list_tasks_in_category(
        &self,
        category_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Vec<Task>> {
        if !services::category_belongs_to_user(&self.pool, category_id, user_id).await? {
            return Err(StoreError::NotFound("Category"));
        }
        services::get_tasks_in_category(&self.pool, category_id, user_id).await
    }

    async fn update_task(&self, task_id: Uuid, user_id: Uuid, patch: TaskPatch) -> StoreResult<Task> {
        if let Some(category_id) = patch.category_id {
            if !services::category_belongs_to_user(&self.pool, category_id, user_id).await? {
                return Err(StoreError::NotFound("Category"));
            }
        }
        services::update_task(&self.pool, task_id, user_id, patch)
            .await?
            .ok_or(StoreError::NotFound("Task"))
    }

    async fn delete_task(&self, task_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        match services::delete_task(&self.pool, task_id, user_id).await? {
            0 => Err(StoreError::NotFound("Task")),
            _ => Ok(()),
        }
    }
}
