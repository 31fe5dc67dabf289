use async_graphql::ID;
use tracing::info;
use uuid::Uuid;

use crate::db::Store;
use crate::db::models::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
use crate::graphql::types::{CreateTaskInput, UpdateTaskInput, parse_id, parse_timestamp};
use crate::services::category_service::first_category_id;
use crate::web::error::AppError;
use crate::web::models::AuthenticatedUser;

pub const NO_CATEGORY: &str = "cannot create task without a category. Please create a category first";

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("title is required".to_string()));
    }
    Ok(title.to_string())
}

/// `None` when the reference is absent or blank.
fn category_reference(id: Option<&ID>) -> Option<&ID> {
    id.filter(|id| !id.trim().is_empty())
}

pub async fn list_tasks(store: &dyn Store, user: &AuthenticatedUser) -> Result<Vec<Task>, AppError> {
    Ok(store.list_tasks(user.id).await?)
}

pub async fn get_task(store: &dyn Store, user: &AuthenticatedUser, id: &ID) -> Result<Task, AppError> {
    let task_id = parse_id("task", id)?;
    Ok(store.get_task(task_id, user.id).await?)
}

pub async fn tasks_in_category(
    store: &dyn Store,
    user: &AuthenticatedUser,
    category_id: Uuid,
) -> Result<Vec<Task>, AppError> {
    Ok(store.list_tasks_in_category(category_id, user.id).await?)
}

pub async fn create_task(
    store: &dyn Store,
    user: &AuthenticatedUser,
    input: CreateTaskInput,
) -> Result<Task, AppError> {
    let title = validate_title(&input.title)?;
    let due_date = parse_timestamp("dueDate", &input.due_date)?;

    let category_id = match category_reference(input.category_id.as_ref()) {
        Some(id) => parse_id("category", id)?,
        None => first_category_id(store, user)
            .await?
            .ok_or_else(|| AppError::InvalidInput(NO_CATEGORY.to_string()))?,
    };

    let new_task = NewTask {
        title,
        description: input.description.unwrap_or_default(),
        status: input.status.unwrap_or(TaskStatus::Todo),
        priority: input.priority.unwrap_or(TaskPriority::Medium),
        due_date,
        category_id,
        tags: input.tags.unwrap_or_default(),
    };

    let task = store.create_task(user.id, new_task).await?;
    info!(user_id = %user.id, task_id = %task.id, "Task created.");
    Ok(task)
}

/// An explicitly empty `categoryId` moves the task to the user's first
/// category; with no categories at all the category is left as is.
pub async fn update_task(
    store: &dyn Store,
    user: &AuthenticatedUser,
    id: &ID,
    input: UpdateTaskInput,
) -> Result<Task, AppError> {
    let task_id = parse_id("task", id)?;

    let category_id = match input.category_id.as_ref() {
        None => None,
        Some(reference) => match category_reference(Some(reference)) {
            Some(id) => Some(parse_id("category", id)?),
            None => first_category_id(store, user).await?,
        },
    };

    let patch = TaskPatch {
        title: input.title.as_deref().map(validate_title).transpose()?,
        description: input.description,
        status: input.status,
        priority: input.priority,
        due_date: input
            .due_date
            .as_deref()
            .map(|value| parse_timestamp("dueDate", value))
            .transpose()?,
        category_id,
        tags: input.tags,
    };

    Ok(store.update_task(task_id, user.id, patch).await?)
}

pub async fn update_task_status(
    store: &dyn Store,
    user: &AuthenticatedUser,
    id: &ID,
    status: TaskStatus,
) -> Result<Task, AppError> {
    let task_id = parse_id("task", id)?;
    Ok(store.update_task_status(task_id, user.id, status).await?)
}

pub async fn delete_task(store: &dyn Store, user: &AuthenticatedUser, id: &ID) -> Result<bool, AppError> {
    let task_id = parse_id("task", id)?;
    store.delete_task(task_id, user.id).await?;
    info!(user_id = %user.id, task_id = %task_id, "Task deleted.");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::category_service::create_category;

    fn identity() -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            name: "Owner".to_string(),
        }
    }

    fn create_input(category_id: Option<&str>) -> CreateTaskInput {
        CreateTaskInput {
            title: "Write report".to_string(),
            description: None,
            status: None,
            priority: None,
            due_date: "2025-06-01T12:00:00Z".to_string(),
            category_id: category_id.map(ID::from),
            tags: None,
        }
    }

    #[tokio::test]
    async fn test_create_without_categories_fails() {
        let store = MemoryStore::new();
        let err = create_task(&store, &identity(), create_input(None)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref msg) if msg == NO_CATEGORY));
    }

    #[tokio::test]
    async fn test_create_defaults_to_first_category() {
        let store = MemoryStore::new();
        let user = identity();
        create_category(&store, &user, "Work").await.unwrap();
        let home = create_category(&store, &user, "Home").await.unwrap();

        let omitted = create_task(&store, &user, create_input(None)).await.unwrap();
        assert_eq!(omitted.category_id, home.id);

        let blank = create_task(&store, &user, create_input(Some(""))).await.unwrap();
        assert_eq!(blank.category_id, home.id);

        assert_eq!(omitted.description, "");
        assert_eq!(omitted.status, TaskStatus::Todo);
        assert_eq!(omitted.priority, TaskPriority::Medium);
        assert!(omitted.tags.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let store = MemoryStore::new();
        let user = identity();
        create_category(&store, &user, "Work").await.unwrap();

        let mut untitled = create_input(None);
        untitled.title = " ".to_string();
        assert!(matches!(
            create_task(&store, &user, untitled).await,
            Err(AppError::InvalidInput(_))
        ));

        let mut undated = create_input(None);
        undated.due_date = "tomorrow".to_string();
        assert!(matches!(
            create_task(&store, &user, undated).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_update_with_empty_category_moves_to_first() {
        let store = MemoryStore::new();
        let user = identity();
        let work = create_category(&store, &user, "Work").await.unwrap();
        let task = create_task(&store, &user, create_input(Some(&work.id.to_string())))
            .await
            .unwrap();
        let admin = create_category(&store, &user, "Admin").await.unwrap();

        let moved = update_task(
            &store,
            &user,
            &ID(task.id.to_string()),
            UpdateTaskInput {
                category_id: Some(ID::from("")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.category_id, admin.id);
        assert_eq!(moved.title, task.title);
    }

    #[tokio::test]
    async fn test_update_parses_due_date() {
        let store = MemoryStore::new();
        let user = identity();
        create_category(&store, &user, "Work").await.unwrap();
        let task = create_task(&store, &user, create_input(None)).await.unwrap();

        let updated = update_task(
            &store,
            &user,
            &ID(task.id.to_string()),
            UpdateTaskInput {
                due_date: Some("2026-01-02T03:04:05Z".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.due_date, parse_timestamp("dueDate", "2026-01-02T03:04:05Z").unwrap());

        let bad = update_task(
            &store,
            &user,
            &ID(task.id.to_string()),
            UpdateTaskInput {
                due_date: Some("soon".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(bad, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_delete_unknown_task_is_not_found() {
        let store = MemoryStore::new();
        let err = delete_task(&store, &identity(), &ID(Uuid::new_v4().to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
