use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use std::collections::HashMap;
use tracing::info;

use crate::auth::require_admin;
use crate::error::{ApiError, ApiResult};
use crate::handlers::parse_id;
use crate::models::location::{CreateLocation, UpdateLocation};
use crate::models::Location;
use crate::repo;
use crate::response::{ApiResponse, Meta};
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(create_location))
        .route("/:id", put(update_location))
        .route("/:id", delete(delete_location))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/", get(list_locations))
        .route("/:id", get(get_location))
        .merge(admin)
}

/// GET /api/locations
async fn list_locations(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ApiResponse<Vec<Location>>>> {
    let (items, total, page) = repo::locations::list(&state.db, &params).await?;
    Ok(ApiResponse::paginated(
        items,
        "Locations",
        Meta::new(page.page, page.limit, total),
    ))
}

/// GET /api/locations/:id
async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Location>>> {
    let id = parse_id(&id)?;
    let item = repo::locations::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Location not found".to_string()))?;
    Ok(ApiResponse::ok(item, "Location"))
}

/// POST /api/locations (admin)
async fn create_location(
    State(state): State<AppState>,
    Json(req): Json<CreateLocation>,
) -> ApiResult<Json<ApiResponse<Location>>> {
    req.validate().map_err(ApiError::Validation)?;

    let item = repo::locations::create(&state.db, &req).await?;
    info!("Created location {}", item.id);
    Ok(ApiResponse::ok(item, "Location created"))
}

/// PUT /api/locations/:id (admin)
async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLocation>,
) -> ApiResult<Json<ApiResponse<Location>>> {
    let id = parse_id(&id)?;
    req.validate().map_err(ApiError::Validation)?;

    let item = repo::locations::update(&state.db, id, &req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Location not found".to_string()))?;
    Ok(ApiResponse::ok(item, "Location updated"))
}

/// DELETE /api/locations/:id (admin)
///
/// Hard delete; packages referencing this location are left untouched.
async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Location>>> {
    let id = parse_id(&id)?;
    let item = repo::locations::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Location not found".to_string()))?;
    info!("Deleted location {}", item.id);
    Ok(ApiResponse::ok(item, "Location deleted"))
}
