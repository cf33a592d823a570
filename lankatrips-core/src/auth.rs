use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::{Role, User};
use crate::{repo, AppState};

/// Claims carried inside the bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the user's UUID as a string
    pub sub: String,
    pub exp: usize,
}

/// Container for the authenticated user stored in request extensions.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Signs a bearer token for the given user id.
pub fn issue_token(user_id: Uuid, config: &Config) -> ApiResult<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(config.jwt_expiration_hours)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))
}

/// Decodes a bearer token and returns the embedded user id.
pub fn verify_token(token: &str, config: &Config) -> ApiResult<Uuid> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| ApiError::Unauthorized("Not authorized (invalid token)".to_string()))?;

    Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| ApiError::Unauthorized("Not authorized (invalid token)".to_string()))
}

/// Resolves the `Authorization: Bearer` header to a user record.
///
/// A token whose user no longer exists is treated the same as an invalid
/// token.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<User> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Not authorized (missing token)".to_string()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Not authorized (missing token)".to_string()))?;

    let user_id = verify_token(token, &state.config)?;

    repo::users::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Not authorized (user not found)".to_string()))
}

/// Middleware for routes that require any authenticated user.
///
/// On success the resolved user is injected into request extensions for
/// downstream handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, req.headers()).await?;
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Middleware for admin-only routes.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, req.headers()).await?;
    if user.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "Forbidden (insufficient role)".to_string(),
        ));
    }
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secret: &str) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_url: "postgres://localhost/test".to_string(),
            jwt_secret: secret.to_string(),
            jwt_expiration_hours: 1,
            default_currency: "LKR".to_string(),
        }
    }

    #[test]
    fn token_round_trips_user_id() {
        let config = test_config("test-secret");
        let user_id = Uuid::new_v4();

        let token = issue_token(user_id, &config).unwrap();
        assert_eq!(verify_token(&token, &config).unwrap(), user_id);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let config = test_config("test-secret");
        let other = test_config("another-secret");

        let token = issue_token(Uuid::new_v4(), &config).unwrap();
        assert!(matches!(
            verify_token(&token, &other),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let config = test_config("test-secret");
        assert!(matches!(
            verify_token("not.a.token", &config),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
