//! The GraphQL schema: per-domain query and mutation roots merged into one.
//!
//! Every user-scoped field resolves the caller through [`require_user`],
//! which reads the [`RequestIdentity`] the session middleware attached to
//! the request. Resolver bodies live in `crate::services` and receive that
//! identity as an explicit argument.

pub mod auth;
pub mod category;
pub mod task;
pub mod types;

use std::sync::Arc;

use async_graphql::extensions::Tracing;
use async_graphql::{Context, EmptySubscription, MergedObject, Schema};

use crate::db::Store;
use crate::services::auth_service::CredentialService;
use crate::web::error::AppError;
use crate::web::models::{AuthenticatedUser, RequestIdentity};

use self::auth::{AuthMutation, AuthQuery};
use self::category::{CategoryMutation, CategoryQuery};
use self::task::{TaskMutation, TaskQuery};

#[derive(MergedObject, Default)]
pub struct QueryRoot(TaskQuery, CategoryQuery, AuthQuery);

#[derive(MergedObject, Default)]
pub struct MutationRoot(TaskMutation, CategoryMutation, AuthMutation);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Attributes applied to the session cookie set by `register` and `login`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    pub secure: bool,
}

pub fn build_schema(
    store: Arc<dyn Store>,
    credentials: Arc<CredentialService>,
    cookie_policy: CookiePolicy,
) -> AppSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(store)
        .data(credentials)
        .data(cookie_policy)
        .extension(Tracing)
        .finish()
}

/// Fails with `AuthenticationRequired` unless the request carries a valid session.
pub fn require_user<'a>(ctx: &Context<'a>) -> Result<&'a AuthenticatedUser, AppError> {
    match ctx.data_opt::<RequestIdentity>() {
        Some(identity) => identity.require(),
        None => Err(AppError::AuthenticationRequired),
    }
}

pub fn store<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a dyn Store> {
    Ok(ctx.data::<Arc<dyn Store>>()?.as_ref())
}

pub fn credentials<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a CredentialService> {
    Ok(ctx.data::<Arc<CredentialService>>()?.as_ref())
}
