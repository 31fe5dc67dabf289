use async_graphql::{Context, ID, Object, Result, ResultExt};

use crate::db::models::TaskStatus;
use crate::graphql::types::{CreateTaskInput, TaskObject, UpdateTaskInput};
use crate::graphql::{require_user, store};
use crate::services::task_service;

#[derive(Default)]
pub struct TaskQuery;

#[Object]
impl TaskQuery {
    /// The caller's tasks, newest first.
    async fn tasks(&self, ctx: &Context<'_>) -> Result<Vec<TaskObject>> {
        let user = require_user(ctx).extend()?;
        let tasks = task_service::list_tasks(store(ctx)?, user).await.extend()?;
        Ok(tasks.into_iter().map(TaskObject).collect())
    }

    async fn task(&self, ctx: &Context<'_>, id: ID) -> Result<TaskObject> {
        let user = require_user(ctx).extend()?;
        task_service::get_task(store(ctx)?, user, &id)
            .await
            .map(TaskObject)
            .extend()
    }
}

#[derive(Default)]
pub struct TaskMutation;

#[Object]
impl TaskMutation {
    async fn create_task(&self, ctx: &Context<'_>, input: CreateTaskInput) -> Result<TaskObject> {
        let user = require_user(ctx).extend()?;
        task_service::create_task(store(ctx)?, user, input)
            .await
            .map(TaskObject)
            .extend()
    }

    async fn update_task(&self, ctx: &Context<'_>, id: ID, input: UpdateTaskInput) -> Result<TaskObject> {
        let user = require_user(ctx).extend()?;
        task_service::update_task(store(ctx)?, user, &id, input)
            .await
            .map(TaskObject)
            .extend()
    }

    async fn update_task_status(&self, ctx: &Context<'_>, id: ID, status: TaskStatus) -> Result<TaskObject> {
        let user = require_user(ctx).extend()?;
        task_service::update_task_status(store(ctx)?, user, &id, status)
            .await
            .map(TaskObject)
            .extend()
    }

    async fn delete_task(&self, ctx: &Context<'_>, id: ID) -> Result<bool> {
        let user = require_user(ctx).extend()?;
        task_service::delete_task(store(ctx)?, user, &id).await.extend()
    }
}
