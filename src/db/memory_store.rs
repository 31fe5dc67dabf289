//! Volatile `Store` used as a test double and for local development.
//!
//! Each table is a map keyed by id. All tables sit behind one
//! `tokio::sync::RwLock`: any write excludes every other reader and writer,
//! while reads run concurrently. This is a fixture, not a production
//! concurrency model. Timestamps are truncated to
//! microseconds to match what Postgres stores.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::error::{CATEGORY_EXISTS, CATEGORY_IN_USE, EMAIL_EXISTS, StoreError};
use crate::db::models::{Category, NewTask, Task, TaskPatch, User, UserPatch};
use crate::db::store::{Store, StoreResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    tasks: HashMap<Uuid, TaskEntry>,
    next_seq: u64,
}

/// Insertion order breaks ties between tasks created within the same microsecond.
struct TaskEntry {
    seq: u64,
    task: Task,
}

impl Tables {
    fn owns_category(&self, category_id: Uuid, user_id: Uuid) -> bool {
        self.categories
            .get(&category_id)
            .is_some_and(|c| c.user_id == user_id)
    }

    fn name_taken(&self, user_id: Uuid, name: &str, except: Option<Uuid>) -> bool {
        self.categories
            .values()
            .any(|c| c.user_id == user_id && c.name == name && Some(c.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn owned_task_mut(&mut self, task_id: Uuid, user_id: Uuid) -> Option<&mut Task> {
        self.tasks
            .get_mut(&task_id)
            .map(|entry| &mut entry.task)
            .filter(|t| t.user_id == user_id)
    }

    /// Tasks matching `filter`, newest first.
    fn tasks_where(&self, filter: impl Fn(&Task) -> bool) -> Vec<Task> {
        let mut entries: Vec<&TaskEntry> = self.tasks.values().filter(|e| filter(&e.task)).collect();
        entries.sort_by(|a, b| {
            b.task
                .created_at
                .cmp(&a.task.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        entries.into_iter().map(|e| e.task.clone()).collect()
    }
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(email, None) {
            return Err(StoreError::AlreadyExists(EMAIL_EXISTS.to_string()));
        }
        let now = now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> StoreResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::NotFound("User"))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound("User"))
    }

    async fn update_user(&self, user_id: Uuid, patch: UserPatch) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if let Some(email) = patch.email.as_deref() {
            if tables.email_taken(email, Some(user_id)) {
                return Err(StoreError::AlreadyExists(EMAIL_EXISTS.to_string()));
            }
        }
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User"))?;
        for assignment in patch.into_assignments() {
            assignment.apply(user);
        }
        user.updated_at = now();
        Ok(user.clone())
    }

    async fn update_user_password(&self, user_id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User"))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = now();
        Ok(())
    }

    async fn create_category(&self, user_id: Uuid, name: &str) -> StoreResult<Category> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(user_id, name, None) {
            return Err(StoreError::AlreadyExists(CATEGORY_EXISTS.to_string()));
        }
        let now = now();
        let category = Category {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, category_id: Uuid, user_id: Uuid) -> StoreResult<Category> {
        let tables = self.tables.read().await;
        tables
            .categories
            .get(&category_id)
            .filter(|c| c.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound("Category"))
    }

    async fn list_categories(&self, user_id: Uuid) -> StoreResult<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn update_category(
        &self,
        category_id: Uuid,
        user_id: Uuid,
        name: &str,
    ) -> StoreResult<Category> {
        let mut tables = self.tables.write().await;
        if !tables.owns_category(category_id, user_id) {
            return Err(StoreError::NotFound("Category"));
        }
        if tables.name_taken(user_id, name, Some(category_id)) {
            return Err(StoreError::AlreadyExists(CATEGORY_EXISTS.to_string()));
        }
        let category = tables
            .categories
            .get_mut(&category_id)
            .ok_or(StoreError::NotFound("Category"))?;
        category.name = name.to_string();
        category.updated_at = now();
        Ok(category.clone())
    }

    async fn delete_category(&self, category_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .tasks
            .values()
            .any(|e| e.task.category_id == category_id && e.task.user_id == user_id)
        {
            return Err(StoreError::HasDependents(CATEGORY_IN_USE.to_string()));
        }
        if !tables.owns_category(category_id, user_id) {
            return Err(StoreError::NotFound("Category"));
        }
        tables.categories.remove(&category_id);
        Ok(())
    }

    async fn count_tasks_in_category(&self, category_id: Uuid, user_id: Uuid) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .tasks
            .values()
            .filter(|e| e.task.category_id == category_id && e.task.user_id == user_id)
            .count();
        Ok(count as i64)
    }

    async fn create_task(&self, user_id: Uuid, input: NewTask) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;
        if !tables.owns_category(input.category_id, user_id) {
            return Err(StoreError::NotFound("Category"));
        }
        let now = now();
        let task = Task {
            id: Uuid::new_v4(),
            user_id,
            category_id: input.category_id,
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            due_date: input.due_date.trunc_subsecs(6),
            tags: input.tags,
            created_at: now,
            updated_at: now,
        };
        tables.next_seq += 1;
        let seq = tables.next_seq;
        tables.tasks.insert(
            task.id,
            TaskEntry {
                seq,
                task: task.clone(),
            },
        );
        Ok(task)
    }

    async fn get_task(&self, task_id: Uuid, user_id: Uuid) -> StoreResult<Task> {
        let tables = self.tables.read().await;
        tables
            .tasks
            .get(&task_id)
            .map(|e| &e.task)
            .filter(|t| t.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound("Task"))
    }

    async fn list_tasks(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        Ok(tables.tasks_where(|t| t.user_id == user_id))
    }

    async fn list_tasks_in_category(
        &self,
        category_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        if !tables.owns_category(category_id, user_id) {
            return Err(StoreError::NotFound("Category"));
        }
        Ok(tables.tasks_where(|t| t.category_id == category_id && t.user_id == user_id))
    }

    async fn update_task(&self, task_id: Uuid, user_id: Uuid, patch: TaskPatch) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;
        if let Some(category_id) = patch.category_id {
            if !tables.owns_category(category_id, user_id) {
                return Err(StoreError::NotFound("Category"));
            }
        }
        let task = tables
            .owned_task_mut(task_id, user_id)
            .ok_or(StoreError::NotFound("Task"))?;
        for assignment in patch.into_assignments() {
            assignment.apply(task);
        }
        task.due_date = task.due_date.trunc_subsecs(6);
        task.updated_at = now();
        Ok(task.clone())
    }

    async fn delete_task(&self, task_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.owned_task_mut(task_id, user_id).is_none() {
            return Err(StoreError::NotFound("Task"));
        }
        tables.tasks.remove(&task_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{TaskPriority, TaskStatus};
    use chrono::Duration;

    fn new_task(category_id: Uuid, title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: Utc::now() + Duration::days(1),
            category_id,
            tags: vec!["a".to_string(), "b".to_string()],
        }
    }

    #[tokio::test]
    async fn test_category_names_unique_per_owner() {
        let store = MemoryStore::new();
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();

        store.create_category(u1, "Work").await.unwrap();
        let dup = store.create_category(u1, "Work").await;
        assert!(matches!(dup, Err(StoreError::AlreadyExists(_))));

        assert!(store.create_category(u2, "Work").await.is_ok());
    }

    #[tokio::test]
    async fn test_cross_owner_access_is_not_found() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let category = store.create_category(owner, "Home").await.unwrap();
        let task = store.create_task(owner, new_task(category.id, "Dishes")).await.unwrap();

        assert!(matches!(
            store.get_task(task.id, stranger).await,
            Err(StoreError::NotFound("Task"))
        ));
        assert!(matches!(
            store.get_category(category.id, stranger).await,
            Err(StoreError::NotFound("Category"))
        ));
        assert!(matches!(
            store.delete_task(task.id, stranger).await,
            Err(StoreError::NotFound("Task"))
        ));
        // Existence of the other user's tasks must not leak through the dependents check.
        assert!(matches!(
            store.delete_category(category.id, stranger).await,
            Err(StoreError::NotFound("Category"))
        ));
        assert!(store.list_tasks(stranger).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_task_requires_owned_category() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let foreign = store.create_category(other, "Theirs").await.unwrap();

        let result = store.create_task(owner, new_task(foreign.id, "Sneaky")).await;
        assert!(matches!(result, Err(StoreError::NotFound("Category"))));
    }

    #[tokio::test]
    async fn test_delete_category_blocked_by_tasks() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let work = store.create_category(owner, "Work").await.unwrap();
        let home = store.create_category(owner, "Home").await.unwrap();
        let task = store.create_task(owner, new_task(work.id, "Report")).await.unwrap();

        assert_eq!(store.count_tasks_in_category(work.id, owner).await.unwrap(), 1);
        assert!(matches!(
            store.delete_category(work.id, owner).await,
            Err(StoreError::HasDependents(_))
        ));

        let patch = TaskPatch {
            category_id: Some(home.id),
            ..Default::default()
        };
        store.update_task(task.id, owner, patch).await.unwrap();
        store.delete_category(work.id, owner).await.unwrap();

        assert!(matches!(
            store.delete_category(work.id, owner).await,
            Err(StoreError::NotFound("Category"))
        ));
    }

    #[tokio::test]
    async fn test_empty_patch_only_refreshes_updated_at() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let category = store.create_category(owner, "Work").await.unwrap();
        let before = store.create_task(owner, new_task(category.id, "Report")).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let after = store
            .update_task(before.id, owner, TaskPatch::default())
            .await
            .unwrap();

        assert!(after.updated_at > before.updated_at);
        assert_eq!(
            Task {
                updated_at: before.updated_at,
                ..after
            },
            before
        );
    }

    #[tokio::test]
    async fn test_tasks_listed_newest_first() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let category = store.create_category(owner, "Work").await.unwrap();
        store.create_task(owner, new_task(category.id, "first")).await.unwrap();
        store.create_task(owner, new_task(category.id, "second")).await.unwrap();

        let titles: Vec<String> = store
            .list_tasks(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.create_user("Ann", "ann@example.com", "hash").await.unwrap();
        let dup = store.create_user("Ann B", "ann@example.com", "hash").await;
        assert!(matches!(dup, Err(StoreError::AlreadyExists(_))));

        let bob = store.create_user("Bob", "bob@example.com", "hash").await.unwrap();
        let patch = UserPatch {
            email: Some("ann@example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_user(bob.id, patch).await,
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_update_task_status() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let category = store.create_category(owner, "Work").await.unwrap();
        let task = store.create_task(owner, new_task(category.id, "Report")).await.unwrap();

        let updated = store
            .update_task_status(task.id, owner, TaskStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.tags, task.tags);
    }

    #[tokio::test]
    async fn test_update_category() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let work = store.create_category(owner, "Work").await.unwrap();
        store.create_category(owner, "Home").await.unwrap();

        let renamed = store.update_category(work.id, owner, "Office").await.unwrap();
        assert_eq!(renamed.name, "Office");
        assert!(renamed.updated_at >= work.updated_at);
        assert_eq!(renamed.created_at, work.created_at);

        // Keeping its own name is not a collision.
        assert!(store.update_category(work.id, owner, "Office").await.is_ok());

        assert!(matches!(
            store.update_category(work.id, owner, "Home").await,
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            store.update_category(work.id, stranger, "Mine now").await,
            Err(StoreError::NotFound("Category"))
        ));
        assert_eq!(store.get_category(work.id, owner).await.unwrap().name, "Office");
    }

    #[tokio::test]
    async fn test_delete_category_after_tasks_deleted() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let work = store.create_category(owner, "Work").await.unwrap();
        let first = store.create_task(owner, new_task(work.id, "One")).await.unwrap();
        let second = store.create_task(owner, new_task(work.id, "Two")).await.unwrap();

        store.delete_task(first.id, owner).await.unwrap();
        assert!(matches!(
            store.delete_category(work.id, owner).await,
            Err(StoreError::HasDependents(_))
        ));

        store.delete_task(second.id, owner).await.unwrap();
        store.delete_category(work.id, owner).await.unwrap();
        assert!(store.list_categories(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_categories_listed_per_owner_by_name() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store.create_category(owner, "Work").await.unwrap();
        store.create_category(owner, "Errands").await.unwrap();

        let names: Vec<String> = store
            .list_categories(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Errands", "Work"]);
        assert!(store.list_categories(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_instant_tasks_keep_insertion_order() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let category = store.create_category(owner, "Work").await.unwrap();
        for i in 0..20 {
            store
                .create_task(owner, new_task(category.id, &format!("task-{i}")))
                .await
                .unwrap();
        }

        let titles: Vec<String> = store
            .list_tasks_in_category(category.id, owner)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        let expected: Vec<String> = (0..20).rev().map(|i| format!("task-{i}")).collect();
        assert_eq!(titles, expected);
    }
}
