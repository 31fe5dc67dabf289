use async_graphql::{Context, Object, Result, ResultExt};

use crate::graphql::types::{
    AuthResponse, ChangePasswordInput, LoginInput, RegisterInput, UpdateProfileInput, UserObject,
};
use crate::graphql::{CookiePolicy, credentials, require_user, store};
use crate::services::account_service::{self, AuthOutcome};
use crate::web::middleware::auth::build_session_cookie;

/// Hands the session token to browsers as an http-only cookie alongside the response body.
fn issue_session(ctx: &Context<'_>, outcome: AuthOutcome) -> AuthResponse {
    let policy = ctx.data_opt::<CookiePolicy>().copied().unwrap_or_default();
    let cookie = build_session_cookie(outcome.token.clone(), policy.secure);
    ctx.append_http_header("set-cookie", cookie.to_string());

    AuthResponse {
        user: UserObject(outcome.user),
        token: outcome.token,
    }
}

#[derive(Default)]
pub struct AuthQuery;

#[Object]
impl AuthQuery {
    async fn me(&self, ctx: &Context<'_>) -> Result<UserObject> {
        let user = require_user(ctx).extend()?;
        account_service::me(store(ctx)?, user)
            .await
            .map(UserObject)
            .extend()
    }
}

#[derive(Default)]
pub struct AuthMutation;

#[Object]
impl AuthMutation {
    async fn register(&self, ctx: &Context<'_>, input: RegisterInput) -> Result<AuthResponse> {
        let outcome = account_service::register(store(ctx)?, credentials(ctx)?, input)
            .await
            .extend()?;
        Ok(issue_session(ctx, outcome))
    }

    async fn login(&self, ctx: &Context<'_>, input: LoginInput) -> Result<AuthResponse> {
        let outcome = account_service::login(store(ctx)?, credentials(ctx)?, input)
            .await
            .extend()?;
        Ok(issue_session(ctx, outcome))
    }

    async fn update_profile(&self, ctx: &Context<'_>, input: UpdateProfileInput) -> Result<UserObject> {
        let user = require_user(ctx).extend()?;
        account_service::update_profile(store(ctx)?, user, input)
            .await
            .map(UserObject)
            .extend()
    }

    async fn change_password(&self, ctx: &Context<'_>, input: ChangePasswordInput) -> Result<bool> {
        let user = require_user(ctx).extend()?;
        account_service::change_password(store(ctx)?, credentials(ctx)?, user, input)
            .await
            .extend()
    }
}
