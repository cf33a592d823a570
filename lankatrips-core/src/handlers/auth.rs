use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::auth::{issue_token, require_auth, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::models::user::{LoginRequest, RegisterRequest, UserResponse};
use crate::models::Role;
use crate::repo;
use crate::response::ApiResponse;
use crate::AppState;

const BCRYPT_COST: u32 = 10;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    req.validate().map_err(ApiError::Validation)?;

    let email = req.email.trim().to_lowercase();
    if repo::users::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash =
        bcrypt::hash(&req.password, BCRYPT_COST).map_err(|e| ApiError::Internal(e.into()))?;

    let user = repo::users::create(
        &state.db,
        req.name.trim(),
        &email,
        &password_hash,
        Role::Customer,
    )
    .await?;

    info!("Registered user {}", user.id);

    let token = issue_token(user.id, &state.config)?;
    Ok(ApiResponse::ok(
        AuthResponse {
            token,
            user: user.into(),
        },
        "Registered",
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    let email = req.email.trim().to_lowercase();

    // Missing user and wrong password produce the same response.
    let user = repo::users::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let matches = bcrypt::verify(&req.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(e.into()))?;
    if !matches {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = issue_token(user.id, &state.config)?;
    Ok(ApiResponse::ok(
        AuthResponse {
            token,
            user: user.into(),
        },
        "Logged in",
    ))
}

/// GET /api/auth/me
async fn me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    Ok(ApiResponse::ok(user.into(), "Me"))
}
