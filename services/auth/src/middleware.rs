//! Middleware for JWT token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::error;

use crate::AppState;

/// Extract and validate the JWT access token from the Authorization header,
/// then expose the authenticated user id to handlers via request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        error!("Failed to validate token: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    if claims.token_type != crate::jwt::TokenType::Access {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let is_blacklisted = state
        .jwt_service
        .is_token_blacklisted(&state.redis_pool, token)
        .await
        .map_err(|e| {
            error!("Failed to check if token is blacklisted: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if is_blacklisted {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(claims.sub);

    Ok(next.run(req).await)
}
