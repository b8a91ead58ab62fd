use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use std::sync::Arc;

use crate::services::auth_service;
use crate::web::{
    AppState,
    error::AppError,
    models::{AuthenticatedUser, LoginRequest, LoginResponse, UserResponse},
};

pub fn create_auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/me", get(me_handler))
}

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
    let response =
        auth_service::login_user(app_state.identities.as_ref(), &app_state.token_keys, payload).await?;
    Ok(Json(response))
}

async fn me_handler(user: AuthenticatedUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user),
    }))
}
