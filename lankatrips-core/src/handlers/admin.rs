use axum::{extract::State, middleware, routing::get, Json, Router};

use crate::auth::require_admin;
use crate::error::ApiResult;
use crate::repo;
use crate::repo::dashboard::DashboardStats;
use crate::response::ApiResponse;
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

/// GET /api/admin/dashboard
///
/// Booking counts per status plus summed PAID-receipt revenue, computed
/// fresh on every call.
async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<DashboardStats>>> {
    let stats = repo::dashboard::stats(&state.db).await?;
    Ok(ApiResponse::ok(stats, "Admin dashboard"))
}
