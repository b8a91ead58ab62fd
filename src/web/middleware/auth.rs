use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::services::auth_service;
use crate::web::{AppState, error::AppError, models::AuthenticatedUser};

/// Handlers that take an `AuthenticatedUser` only run for requests whose bearer
/// token resolves to a stored identity.
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        auth_service::authenticate(&parts.headers, &state.token_keys, state.identities.as_ref()).await
    }
}
