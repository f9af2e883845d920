//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    models::{ChangePasswordRequest, LoginRequest, RegisterRequest, User, UserResponse},
    validation::{validate_email, validate_password, validate_username},
};

/// Response for token generation
#[derive(Serialize)]
pub struct TokenResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request carrying a refresh token (refresh and logout)
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Response for token refresh
#[derive(Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/me", get(current_user))
        .route("/auth/change-password", post(change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Registration attempt for username: {}", payload.username);

    validate_username(&payload.username).map_err(AuthError::BadRequest)?;
    validate_email(&payload.email).map_err(AuthError::BadRequest)?;
    validate_password(&payload.password).map_err(AuthError::BadRequest)?;

    if payload.password != payload.confirm_password {
        return Err(AuthError::BadRequest("Passwords do not match".to_string()));
    }

    if state
        .user_repository
        .find_by_email(&payload.email)
        .await
        .map_err(internal)?
        .is_some()
    {
        return Err(AuthError::Conflict(
            "User with that email already exists".to_string(),
        ));
    }

    if state
        .user_repository
        .find_by_username(&payload.username)
        .await
        .map_err(internal)?
        .is_some()
    {
        return Err(AuthError::Conflict(
            "User with that username already exists".to_string(),
        ));
    }

    let user = state
        .user_repository
        .create(&payload.username, &payload.email, &payload.password)
        .await
        .map_err(internal)?;

    let response = issue_tokens(&state, &user).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Login attempt for email: {}", payload.email);

    let allowed = state
        .rate_limiter
        .is_allowed(&payload.email)
        .await
        .map_err(internal)?;
    if !allowed {
        warn!("Rate limit hit for email: {}", payload.email);
        return Err(AuthError::TooManyRequests);
    }

    let user = state
        .user_repository
        .find_by_email(&payload.email)
        .await
        .map_err(internal)?
        .ok_or(AuthError::InvalidCredentials)?;

    let password_ok = state
        .user_repository
        .verify_password(&user, &payload.password)
        .map_err(internal)?;
    if !password_ok {
        return Err(AuthError::InvalidCredentials);
    }

    let response = issue_tokens(&state, &user).await?;

    Ok((StatusCode::OK, Json(response)))
}

/// Refresh token endpoint with rotation
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let claims = state
        .jwt_service
        .validate_token(&payload.refresh_token)
        .map_err(|_| AuthError::Unauthorized)?;

    if claims.token_type != crate::jwt::TokenType::Refresh {
        return Err(AuthError::Unauthorized);
    }

    let is_blacklisted = state
        .jwt_service
        .is_token_blacklisted(&state.redis_pool, &payload.refresh_token)
        .await
        .map_err(internal)?;
    if is_blacklisted {
        return Err(AuthError::Unauthorized);
    }

    let session_valid = state
        .session_manager
        .is_session_valid(claims.sub, &payload.refresh_token)
        .await
        .map_err(internal)?;
    if !session_valid {
        return Err(AuthError::Unauthorized);
    }

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await
        .map_err(internal)?
        .ok_or(AuthError::Unauthorized)?;

    let access_token = state
        .jwt_service
        .generate_access_token(&user)
        .map_err(internal)?;

    let new_refresh_token = state
        .jwt_service
        .rotate_refresh_token(&state.redis_pool, &user, &payload.refresh_token)
        .await
        .map_err(internal)?;

    state
        .session_manager
        .create_session(user.id, &new_refresh_token)
        .await
        .map_err(internal)?;

    let response = RefreshTokenResponse {
        access_token,
        refresh_token: new_refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let claims = state
        .jwt_service
        .validate_token(&payload.refresh_token)
        .map_err(|_| AuthError::Unauthorized)?;

    if claims.token_type != crate::jwt::TokenType::Refresh {
        return Err(AuthError::Unauthorized);
    }

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(internal)?
        .as_secs();

    let expiry = claims.exp.saturating_sub(now);
    state
        .jwt_service
        .blacklist_token(&state.redis_pool, &payload.refresh_token, expiry)
        .await
        .map_err(internal)?;

    state
        .session_manager
        .delete_session(claims.sub)
        .await
        .map_err(internal)?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Logged out successfully"})),
    ))
}

/// Current authenticated user endpoint
pub async fn current_user(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state
        .user_repository
        .find_by_id(user_id)
        .await
        .map_err(internal)?
        .ok_or(AuthError::Unauthorized)?;

    Ok(Json(UserResponse::from(&user)))
}

/// Password change endpoint
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.new_password != payload.confirm_new_password {
        return Err(AuthError::BadRequest(
            "New passwords do not match".to_string(),
        ));
    }

    validate_password(&payload.new_password).map_err(AuthError::BadRequest)?;

    let user = state
        .user_repository
        .find_by_id(user_id)
        .await
        .map_err(internal)?
        .ok_or(AuthError::Unauthorized)?;

    let password_ok = state
        .user_repository
        .verify_password(&user, &payload.current_password)
        .map_err(internal)?;
    if !password_ok {
        return Err(AuthError::BadRequest(
            "Incorrect current password".to_string(),
        ));
    }

    state
        .user_repository
        .update_password(user.id, &payload.new_password)
        .await
        .map_err(internal)?;

    Ok(Json(serde_json::json!({
        "message": "Password changed successfully"
    })))
}

async fn issue_tokens(state: &AppState, user: &User) -> Result<TokenResponse, AuthError> {
    let access_token = state
        .jwt_service
        .generate_access_token(user)
        .map_err(internal)?;

    let refresh_token = state
        .jwt_service
        .generate_refresh_token(user)
        .map_err(internal)?;

    state
        .session_manager
        .create_session(user.id, &refresh_token)
        .await
        .map_err(internal)?;

    Ok(TokenResponse {
        user: UserResponse::from(user),
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    })
}

fn internal<E: std::fmt::Display>(e: E) -> AuthError {
    error!("Internal error: {}", e);
    AuthError::InternalServerError
}

/// Custom error type for authentication errors
#[derive(Debug)]
pub enum AuthError {
    BadRequest(String),
    Conflict(String),
    InvalidCredentials,
    Unauthorized,
    TooManyRequests,
    InternalServerError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AuthError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many attempts, try again later".to_string(),
            ),
            AuthError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
