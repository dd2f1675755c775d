use super::JsonBody;
use crate::{auth, error::AppError, models::User, password, utils::username, AppState};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    /// JWT for backend API authentication
    pub token: String,
    pub user: UserResponse,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Pull both credentials out of a request, rejecting blanks
fn required_credentials(payload: CredentialsRequest) -> Result<(String, String), AppError> {
    match (payload.username, payload.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Ok((username, password))
        }
        _ => Err(AppError::Validation(
            "Username and password are required".to_string(),
        )),
    }
}

fn issue_token(state: &AppState, user: &User) -> Result<String, AppError> {
    auth::generate_token(
        user.id,
        &user.username,
        &state.config.security.jwt_secret,
        state.config.security.token_ttl_hours,
    )
    .map_err(|e| {
        tracing::error!("Failed to generate JWT token: {}", e);
        AppError::Internal(e.into())
    })
}

/// Register a new user and log them in
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<CredentialsRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (raw_username, password) = required_credentials(payload)?;
    let username = username::normalize_username(&raw_username)
        .map_err(|msg| AppError::Validation(msg.to_string()))?;

    if state.store.get_user_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    // Hashing is deliberately slow; keep it off the async workers
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(anyhow::Error::from)?
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            AppError::Internal(e.into())
        })?;

    // A concurrent registration can still win the race; the store reports it as a duplicate
    let user = state.store.create_user(&username, &password_hash).await?;

    tracing::info!("Registered user: {} ({})", user.username, user.id);

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse {
        message: "User registered successfully",
        token,
        user: UserResponse::from(&user),
    }))
}

/// Exchange a username and password for a token
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<CredentialsRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (raw_username, password) = required_credentials(payload)?;
    let username = raw_username.trim().to_lowercase();

    let user = state.store.get_user_by_username(&username).await?;

    // Unknown users still pay for a verify so timing doesn't reveal which names exist
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let valid = tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => password::verify_password(&password, &hash),
        None => password::verify_unknown_user(&password),
    })
    .await
    .map_err(anyhow::Error::from)?;

    let user = match user {
        Some(user) if valid => user,
        Some(user) => {
            tracing::info!("Failed login for user: {} ({})", user.username, user.id);
            return Err(AppError::InvalidCredentials);
        }
        None => {
            tracing::debug!("Login for unknown user: {}", username);
            return Err(AppError::InvalidCredentials);
        }
    };

    tracing::info!("User logged in: {} ({})", user.username, user.id);

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user: UserResponse::from(&user),
    }))
}

/// Get current user info from the store
pub async fn get_current_user(
    user: auth::AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<UserResponse>, AppError> {
    tracing::debug!(
        "Getting user info for authenticated user: {} ({})",
        user.username,
        user.user_id
    );

    let db_user = state.store.get_user(user.user_id).await?.ok_or_else(|| {
        tracing::warn!("User not found in store: {}", user.user_id);
        AppError::NotFound("User not found".to_string())
    })?;

    Ok(Json(UserResponse::from(&db_user)))
}
