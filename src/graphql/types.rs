//! GraphQL object and input types.
//!
//! Timestamps cross the boundary as RFC 3339 strings. Objects wrap the
//! domain models so storage-only fields (owner ids, password hashes) never
//! reach the schema.

use async_graphql::{Context, ID, InputObject, Object, Result, ResultExt, SimpleObject};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::db::models::{Category, Task, TaskPriority, TaskStatus, User};
use crate::graphql::{require_user, store};
use crate::services::{category_service, task_service};
use crate::web::error::AppError;

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            AppError::InvalidInput(format!(
                "{field} must be an ISO-8601 timestamp such as 2025-01-31T09:00:00Z, got '{value}'"
            ))
        })
}

/// A malformed id can never name a row, so it reads as not found.
pub fn parse_id(entity: &str, id: &ID) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::NotFound(format!("{entity} not found")))
}

pub struct TaskObject(pub Task);

#[Object(name = "Task")]
impl TaskObject {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn description(&self) -> &str {
        &self.0.description
    }

    async fn status(&self) -> TaskStatus {
        self.0.status
    }

    async fn priority(&self) -> TaskPriority {
        self.0.priority
    }

    async fn due_date(&self) -> String {
        format_timestamp(&self.0.due_date)
    }

    async fn created_at(&self) -> String {
        format_timestamp(&self.0.created_at)
    }

    async fn updated_at(&self) -> String {
        format_timestamp(&self.0.updated_at)
    }

    async fn category(&self, ctx: &Context<'_>) -> Result<CategoryObject> {
        let user = require_user(ctx).extend()?;
        category_service::category_of_task(store(ctx)?, user, &self.0)
            .await
            .map(CategoryObject)
            .extend()
    }

    async fn tags(&self) -> &[String] {
        &self.0.tags
    }
}

pub struct CategoryObject(pub Category);

#[Object(name = "Category")]
impl CategoryObject {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn tasks(&self, ctx: &Context<'_>) -> Result<Vec<TaskObject>> {
        let user = require_user(ctx).extend()?;
        task_service::tasks_in_category(store(ctx)?, user, self.0.id)
            .await
            .map(|tasks| tasks.into_iter().map(TaskObject).collect())
            .extend()
    }

    async fn created_at(&self) -> String {
        format_timestamp(&self.0.created_at)
    }

    async fn updated_at(&self) -> String {
        format_timestamp(&self.0.updated_at)
    }
}

pub struct UserObject(pub User);

#[Object(name = "User")]
impl UserObject {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn created_at(&self) -> String {
        format_timestamp(&self.0.created_at)
    }

    async fn updated_at(&self) -> String {
        format_timestamp(&self.0.updated_at)
    }
}

#[derive(SimpleObject)]
pub struct AuthResponse {
    pub user: UserObject,
    pub token: String,
}

#[derive(InputObject, Debug, Clone)]
pub struct CreateTaskInput {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: String,
    /// Omitted or empty: the user's first category (by name) is used.
    pub category_id: Option<ID>,
    pub tags: Option<Vec<String>>,
}

#[derive(InputObject, Debug, Clone, Default)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<String>,
    pub category_id: Option<ID>,
    pub tags: Option<Vec<String>>,
}

#[derive(InputObject, Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(InputObject, Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(InputObject, Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(InputObject, Debug, Clone)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}
