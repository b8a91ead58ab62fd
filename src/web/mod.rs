use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::get,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::config::ServerConfig;
use crate::db::IdentityStore;
use crate::services::auth_service::TokenKeys;
use crate::web::middleware::request_timing::request_timing;
use crate::web::routes::{admin_routes, auth_routes};

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub token_keys: TokenKeys,
    pub identities: Arc<dyn IdentityStore>,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>, identities: Arc<dyn IdentityStore>) -> Self {
        let token_keys = TokenKeys::from_config(&config);
        Self {
            config,
            token_keys,
            identities,
        }
    }
}

async fn root_handler() -> &'static str {
    "Blog API is running"
}

async fn health_check_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let origin = match frontend_url.map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(e)) => {
            warn!(error = %e, "FRONTEND_URL is not a valid origin, allowing any origin.");
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn create_axum_router(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(app_state.config.frontend_url.as_deref());

    Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_check_handler))
        .nest("/api/auth", auth_routes::create_auth_router())
        .nest("/api/admin", admin_routes::create_admin_router())
        .with_state(app_state)
        .layer(axum_middleware::from_fn(request_timing))
        .layer(cors)
}
