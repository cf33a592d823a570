use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::Utc;
use std::collections::HashMap;
use tracing::info;

use crate::auth::{require_admin, require_auth, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::handlers::parse_id;
use crate::models::booking::{
    AdminBooking, BookingCreated, BookingWithPackage, CreateBooking, UpdateBookingStatus,
};
use crate::models::{Booking, BookingStatus};
use crate::repo;
use crate::response::{ApiResponse, Meta};
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let authed = Router::new()
        .route("/", post(create_booking))
        .route("/me", get(list_my_bookings))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let admin = Router::new()
        .route("/", get(list_all_bookings))
        .route("/:id/status", patch(update_booking_status))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    authed.merge(admin)
}

/// POST /api/bookings
///
/// Creates the booking and issues its receipt in one transaction; the
/// caller gets both ids back.
async fn create_booking(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateBooking>,
) -> ApiResult<Json<ApiResponse<BookingCreated>>> {
    let date = req
        .validate(Utc::now().date_naive())
        .map_err(ApiError::Validation)?;

    let package = repo::packages::find(&state.db, req.package_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Package not found".to_string()))?;

    let (booking, receipt) = repo::bookings::create_with_receipt(
        &state.db,
        user.id,
        &package,
        date,
        &req,
        &state.config.default_currency,
    )
    .await?;

    info!(
        "Booking {} created for user {} with receipt {}",
        booking.id, user.id, receipt.receipt_no
    );

    Ok(ApiResponse::ok(
        BookingCreated {
            booking_id: booking.id,
            receipt_id: receipt.id,
        },
        "Booking created",
    ))
}

/// GET /api/bookings/me
async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<Vec<BookingWithPackage>>>> {
    let items = repo::bookings::list_mine(&state.db, user.id).await?;
    Ok(ApiResponse::ok(items, "My bookings"))
}

/// GET /api/bookings (admin)
async fn list_all_bookings(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ApiResponse<Vec<AdminBooking>>>> {
    let (items, total, page) = repo::bookings::list_all(&state.db, &params).await?;
    Ok(ApiResponse::paginated(
        items,
        "Bookings",
        Meta::new(page.page, page.limit, total),
    ))
}

/// PATCH /api/bookings/:id/status (admin)
///
/// Any enum value is accepted from any current status; out-of-enum values
/// are rejected and the booking stays unchanged.
async fn update_booking_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookingStatus>,
) -> ApiResult<Json<ApiResponse<Booking>>> {
    let id = parse_id(&id)?;
    let status: BookingStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::invalid("body.status", "Invalid status"))?;

    let booking = repo::bookings::set_status(&state.db, id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;

    info!("Booking {} status set to {}", booking.id, booking.status);
    Ok(ApiResponse::ok(booking, "Booking status updated"))
}
