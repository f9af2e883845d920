//! Authentication middleware for JWT token validation

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::{
    error::RentalError,
    models::{Actor, Role},
    state::AppState,
};

/// The claims this service needs from an access token issued by the auth
/// service
#[derive(Debug, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User role ("user" or "admin")
    pub role: String,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum, mirroring the auth service's claim
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Verifies access tokens against the auth service's public key
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier from environment configuration
    ///
    /// # Environment Variables
    /// - `JWT_PUBLIC_KEY`: Public key for verifying tokens (PEM format) or path to a key file
    pub fn from_env() -> anyhow::Result<Self> {
        let public_key = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PUBLIC_KEY environment variable not set"))?;

        let public_key = if public_key.starts_with("-----BEGIN") {
            public_key
        } else {
            std::fs::read_to_string(&public_key)
                .or_else(|_| {
                    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
                    path.push(&public_key);
                    std::fs::read_to_string(path)
                })
                .map_err(|e| anyhow::anyhow!("Failed to read public key file: {}", e))?
                .trim()
                .to_string()
        };

        let decoding_key = DecodingKey::from_rsa_pem(public_key.as_bytes())?;
        let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
        validation.validate_exp = true;

        Ok(JwtVerifier {
            decoding_key,
            validation,
        })
    }

    /// Validate a token and return the claims
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let token_data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

/// Validate the bearer token and expose the actor to handlers via request
/// extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, RentalError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(unauthorized)?;

    let claims = state.jwt_verifier.verify(token).map_err(|e| {
        error!("Failed to validate token: {}", e);
        unauthorized()
    })?;

    if claims.token_type != TokenType::Access {
        return Err(unauthorized());
    }

    let role: Role = claims.role.parse().map_err(|e| {
        error!("Token carries an invalid role claim: {}", e);
        unauthorized()
    })?;

    let actor = Actor {
        id: claims.sub,
        role,
    };

    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}

/// Reject non-admin actors; layered inside `auth_middleware`
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, RentalError> {
    let actor = req
        .extensions()
        .get::<Actor>()
        .cloned()
        .ok_or_else(unauthorized)?;

    if actor.role != Role::Admin {
        return Err(RentalError::Authorization(
            "You are not authorized to view this resource".to_string(),
        ));
    }

    Ok(next.run(req).await)
}

fn unauthorized() -> RentalError {
    RentalError::Unauthenticated
}
