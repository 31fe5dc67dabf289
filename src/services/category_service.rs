use async_graphql::ID;
use tracing::info;
use uuid::Uuid;

use crate::db::Store;
use crate::db::models::{Category, Task};
use crate::graphql::types::parse_id;
use crate::web::error::AppError;
use crate::web::models::AuthenticatedUser;

fn validate_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("category name is required".to_string()));
    }
    Ok(name)
}

pub async fn list_categories(store: &dyn Store, user: &AuthenticatedUser) -> Result<Vec<Category>, AppError> {
    Ok(store.list_categories(user.id).await?)
}

pub async fn get_category(store: &dyn Store, user: &AuthenticatedUser, id: &ID) -> Result<Category, AppError> {
    let category_id = parse_id("category", id)?;
    Ok(store.get_category(category_id, user.id).await?)
}

pub async fn create_category(store: &dyn Store, user: &AuthenticatedUser, name: &str) -> Result<Category, AppError> {
    let category = store.create_category(user.id, validate_name(name)?).await?;
    info!(user_id = %user.id, category_id = %category.id, "Category created.");
    Ok(category)
}

pub async fn update_category(
    store: &dyn Store,
    user: &AuthenticatedUser,
    id: &ID,
    name: &str,
) -> Result<Category, AppError> {
    let category_id = parse_id("category", id)?;
    Ok(store.update_category(category_id, user.id, validate_name(name)?).await?)
}

/// Refused with `HasDependents` while any of the user's tasks is filed under it.
pub async fn delete_category(store: &dyn Store, user: &AuthenticatedUser, id: &ID) -> Result<bool, AppError> {
    let category_id = parse_id("category", id)?;
    store.delete_category(category_id, user.id).await?;
    info!(user_id = %user.id, category_id = %category_id, "Category deleted.");
    Ok(true)
}

pub async fn category_of_task(store: &dyn Store, user: &AuthenticatedUser, task: &Task) -> Result<Category, AppError> {
    Ok(store.get_category(task.category_id, user.id).await?)
}

/// The category used when a task names none: the user's first by name.
pub async fn first_category_id(store: &dyn Store, user: &AuthenticatedUser) -> Result<Option<Uuid>, AppError> {
    let categories = store.list_categories(user.id).await?;
    Ok(categories.first().map(|category| category.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn identity(id: Uuid) -> AuthenticatedUser {
        AuthenticatedUser {
            id,
            email: format!("{id}@example.com"),
            name: "Tester".to_string(),
        }
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let store = MemoryStore::new();
        let user = identity(Uuid::new_v4());
        let result = create_category(&store, &user, "   ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_first_category_is_first_by_name() {
        let store = MemoryStore::new();
        let user = identity(Uuid::new_v4());
        assert_eq!(first_category_id(&store, &user).await.unwrap(), None);

        create_category(&store, &user, "Work").await.unwrap();
        let errands = create_category(&store, &user, "Errands").await.unwrap();
        assert_eq!(first_category_id(&store, &user).await.unwrap(), Some(errands.id));
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let store = MemoryStore::new();
        let user = identity(Uuid::new_v4());
        let err = get_category(&store, &user, &ID::from("not-a-uuid")).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
