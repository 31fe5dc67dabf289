use async_graphql::{Context, ID, Object, Result, ResultExt};

use crate::graphql::types::CategoryObject;
use crate::graphql::{require_user, store};
use crate::services::category_service;

#[derive(Default)]
pub struct CategoryQuery;

#[Object]
impl CategoryQuery {
    /// The caller's categories ordered by name.
    async fn categories(&self, ctx: &Context<'_>) -> Result<Vec<CategoryObject>> {
        let user = require_user(ctx).extend()?;
        let categories = category_service::list_categories(store(ctx)?, user).await.extend()?;
        Ok(categories.into_iter().map(CategoryObject).collect())
    }

    async fn category(&self, ctx: &Context<'_>, id: ID) -> Result<CategoryObject> {
        let user = require_user(ctx).extend()?;
        category_service::get_category(store(ctx)?, user, &id)
            .await
            .map(CategoryObject)
            .extend()
    }
}

#[derive(Default)]
pub struct CategoryMutation;

#[Object]
impl CategoryMutation {
    async fn create_category(&self, ctx: &Context<'_>, name: String) -> Result<CategoryObject> {
        let user = require_user(ctx).extend()?;
        category_service::create_category(store(ctx)?, user, &name)
            .await
            .map(CategoryObject)
            .extend()
    }

    async fn update_category(&self, ctx: &Context<'_>, id: ID, name: String) -> Result<CategoryObject> {
        let user = require_user(ctx).extend()?;
        category_service::update_category(store(ctx)?, user, &id, &name)
            .await
            .map(CategoryObject)
            .extend()
    }

    async fn delete_category(&self, ctx: &Context<'_>, id: ID) -> Result<bool> {
        let user = require_user(ctx).extend()?;
        category_service::delete_category(store(ctx)?, user, &id).await.extend()
    }
}
