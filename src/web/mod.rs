use async_graphql::http::{GraphQLPlaygroundConfig, playground_source};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Extension, Json, Router,
    extract::State,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::graphql::AppSchema;
use crate::server::config::ServerConfig;
use crate::services::auth_service::CredentialService;
use crate::web::middleware::auth::{self, build_removal_cookie};
use crate::web::models::RequestIdentity;

pub mod error;
pub mod middleware;
pub mod models;

pub use error::AppError;

pub const GRAPHQL_PATH: &str = "/query";

#[derive(Clone)]
pub struct AppState {
    pub schema: AppSchema,
    pub credentials: Arc<CredentialService>,
    pub config: Arc<ServerConfig>,
}

async fn graphql_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<RequestIdentity>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    app_state
        .schema
        .execute(req.into_inner().data(identity))
        .await
        .into()
}

async fn playground_handler() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new(GRAPHQL_PATH)))
}

async fn health_check_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "dotask-backend" }))
}

async fn logout_handler(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<serde_json::Value>) {
    let jar = jar.add(build_removal_cookie(app_state.config.cookie_secure));
    (
        jar,
        Json(serde_json::json!({ "success": true, "message": "Logged out successfully" })),
    )
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            warn!(error = %e, frontend_url, "FRONTEND_URL is not a valid origin; cross-origin requests will be refused.");
            cors
        }
    }
}

pub fn create_axum_router(
    schema: AppSchema,
    credentials: Arc<CredentialService>,
    config: Arc<ServerConfig>,
) -> Router {
    let cors = cors_layer(&config.frontend_url);
    let app_state = Arc::new(AppState {
        schema,
        credentials,
        config,
    });

    Router::new()
        .route("/", get(playground_handler))
        .route(GRAPHQL_PATH, post(graphql_handler))
        .route("/health", get(health_check_handler))
        .route("/api/logout", post(logout_handler))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::session))
        .with_state(app_state)
        .layer(cors)
}
