use axum::http::{HeaderMap, header};
use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::db::IdentityStore;
use crate::db::enums::Role;
use crate::web::error::AppError;
use crate::web::models::{AuthenticatedUser, Claims, LoginRequest, LoginResponse, UserResponse};

/// Signing material and lifetime for issued tokens, built once at startup.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.jwt_secret, Duration::hours(config.jwt_expire_hours))
    }
}

pub fn issue_token(identity_id: i32, keys: &TokenKeys) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(keys.ttl)
        .ok_or_else(|| AppError::TokenCreationError("token lifetime out of range".to_string()))?;
    let claims = Claims {
        sub: identity_id.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
        .map_err(|e| AppError::TokenCreationError(e.to_string()))
}

/// Checks signature and expiry. Every failure collapses into `InvalidToken`.
pub fn verify_token(token: &str, keys: &TokenKeys) -> Result<Claims, AppError> {
    decode::<Claims>(token, &keys.decoding, &Validation::new(Algorithm::HS256))
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = ?e, "JWT verification failed.");
            AppError::InvalidToken
        })
}

/// Extracts `<token>` from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AppError::InvalidToken)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AppError::InvalidToken);
    }
    Ok(token)
}

/// Resolves the principal behind a request's bearer token.
///
/// Performs exactly one identity-store lookup once the token verifies.
pub async fn authenticate(
    headers: &HeaderMap,
    keys: &TokenKeys,
    store: &dyn IdentityStore,
) -> Result<AuthenticatedUser, AppError> {
    let token = bearer_token(headers)?;
    let claims = verify_token(token, keys)?;
    let id: i32 = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;

    match store.find_by_id(id).await {
        Ok(Some(model)) => Ok(AuthenticatedUser::from(model)),
        Ok(None) => {
            warn!(user_id = id, "Token subject does not match any user.");
            Err(AppError::IdentityNotFound)
        }
        Err(e) => Err(AppError::DatabaseError(e.to_string())),
    }
}

/// Pure role check against an already resolved principal.
pub fn authorize(principal: &AuthenticatedUser, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(principal.role))
    }
}

pub async fn login_user(
    store: &dyn IdentityStore,
    keys: &TokenKeys,
    req: LoginRequest,
) -> Result<LoginResponse, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Please provide an email and password".to_string(),
        ));
    }

    let user = store
        .find_by_email(&req.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid_password = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("password verification failed: {e}")))?;
    if !valid_password {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(user.id, keys)?;
    Ok(LoginResponse {
        success: true,
        token,
        user: UserResponse::from(&user),
    })
}
