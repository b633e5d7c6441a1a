/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /register` - Create an account and get a token
/// - `POST /login` - Exchange credentials for a token
///
/// Both answer `201` with `{ "success": true, "token": "...", "message": "..." }`.
/// Tokens are valid for one day.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use todolist_shared::{
    auth::{
        middleware::Identity,
        password::{CredentialHasher, PasswordError},
    },
    models::{user::normalize_email, CreateUser},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Display name
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Token response shared by register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub success: bool,

    /// Bearer token (1 day)
    pub token: String,

    pub message: String,
}

/// Register a new user
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already registered
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let email = normalize_email(&req.email);
    let password_hash = hash_blocking(state.hasher.clone(), req.password).await?;

    let user = state
        .store
        .create_user(CreateUser {
            email,
            name: req.name,
            password_hash,
        })
        .await?;

    let token = state
        .auth
        .codec()
        .issue(&Identity::new(user.id, user.email.clone()))?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            success: true,
            token,
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// Log in with email and password
///
/// Unknown emails and wrong passwords get the same 401 so the endpoint does not
/// reveal which accounts exist.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid email or password
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let email = normalize_email(&req.email);

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        tracing::debug!("Login attempt for unknown email");
        return Err(invalid_credentials());
    };

    let valid = verify_blocking(state.hasher.clone(), req.password, user.password_hash.clone()).await?;
    if !valid {
        tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
        return Err(invalid_credentials());
    }

    let token = state
        .auth
        .codec()
        .issue(&Identity::new(user.id, user.email.clone()))?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            success: true,
            token,
            message: "User logged in successfully".to_string(),
        }),
    ))
}

/// Emails are validated after surrounding whitespace is removed
fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".to_string())
}

async fn hash_blocking(hasher: Arc<dyn CredentialHasher>, password: String) -> ApiResult<String> {
    let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ApiError::InternalError(format!("Hashing task failed: {}", e)))??;
    Ok(hash)
}

async fn verify_blocking(
    hasher: Arc<dyn CredentialHasher>,
    password: String,
    hash: String,
) -> ApiResult<bool> {
    let result: Result<bool, PasswordError> =
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| ApiError::InternalError(format!("Verification task failed: {}", e)))?;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_email_trimmed_before_validation() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email": "  A@X.com ", "name": "A", "password": "pw123456"}"#,
        )
        .unwrap();

        assert_eq!(req.email, "A@X.com");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_login_email_trimmed_before_validation() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email": "\ta@x.com\n", "password": "pw"}"#).unwrap();

        assert_eq!(req.email, "a@x.com");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_blank_email_still_invalid() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email": "   ", "password": "pw"}"#).unwrap();

        assert!(req.validate().is_err());
    }
}
