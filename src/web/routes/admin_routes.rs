use axum::{
    Json, Router,
    extract::{Path, State, rejection::PathRejection},
    routing::get,
};
use std::sync::Arc;

use crate::db::enums::Role;
use crate::services::auth_service::authorize;
use crate::web::{
    AppState,
    error::AppError,
    models::{AuthenticatedUser, UserResponse},
};

pub fn create_admin_router() -> Router<Arc<AppState>> {
    Router::new().route("/identities/{id}", get(get_identity))
}

async fn get_identity(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    authorize(&user, &[Role::Admin])?;
    let Path(id) = id.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;

    let model = app_state
        .identities
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No user with id {id}")))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": UserResponse::from(&model),
    })))
}
