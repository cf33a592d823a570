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
use crate::models::package::{CreatePackage, PackageDetail, PackageListItem, UpdatePackage};
use crate::models::Package;
use crate::repo;
use crate::response::{ApiResponse, Meta};
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(create_package))
        .route("/:id", put(update_package))
        .route("/:id", delete(delete_package))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/", get(list_packages))
        .route("/:id", get(get_package))
        .merge(admin)
}

/// GET /api/packages
///
/// Public list with category/region/search filters and inclusive
/// price/duration ranges. Location references resolve to summaries.
async fn list_packages(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ApiResponse<Vec<PackageListItem>>>> {
    let (items, total, page) = repo::packages::list(&state.db, &params).await?;
    Ok(ApiResponse::paginated(
        items,
        "Packages",
        Meta::new(page.page, page.limit, total),
    ))
}

/// GET /api/packages/:id
async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<PackageDetail>>> {
    let id = parse_id(&id)?;
    let item = repo::packages::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Package not found".to_string()))?;
    Ok(ApiResponse::ok(item, "Package"))
}

/// POST /api/packages (admin)
async fn create_package(
    State(state): State<AppState>,
    Json(req): Json<CreatePackage>,
) -> ApiResult<Json<ApiResponse<Package>>> {
    req.validate().map_err(ApiError::Validation)?;

    let item = repo::packages::create(&state.db, &req).await?;
    info!("Created package {}", item.id);
    Ok(ApiResponse::ok(item, "Package created"))
}

/// PUT /api/packages/:id (admin)
async fn update_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePackage>,
) -> ApiResult<Json<ApiResponse<Package>>> {
    let id = parse_id(&id)?;
    req.validate().map_err(ApiError::Validation)?;

    let item = repo::packages::update(&state.db, id, &req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Package not found".to_string()))?;
    Ok(ApiResponse::ok(item, "Package updated"))
}

/// DELETE /api/packages/:id (admin)
///
/// Hard delete; existing bookings keep their stale reference and frozen
/// price.
async fn delete_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Package>>> {
    let id = parse_id(&id)?;
    let item = repo::packages::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Package not found".to_string()))?;
    info!("Deleted package {}", item.id);
    Ok(ApiResponse::ok(item, "Package deleted"))
}
