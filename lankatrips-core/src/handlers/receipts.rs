use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    middleware,
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use std::collections::HashMap;

use crate::auth::{require_admin, require_auth, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::handlers::parse_id;
use crate::models::receipt::{MyReceipt, ReceiptDetail};
use crate::models::Role;
use crate::pdf::{render_receipt, ReceiptPdf};
use crate::repo;
use crate::response::{ApiResponse, Meta};
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let authed = Router::new()
        .route("/me", get(list_my_receipts))
        .route("/:id/pdf", get(download_receipt_pdf))
        .route("/:id", get(get_receipt))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let admin = Router::new()
        .route("/", get(list_all_receipts))
        .route("/export/csv", get(export_receipts_csv))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    authed.merge(admin)
}

/// GET /api/receipts/me
async fn list_my_receipts(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<Vec<MyReceipt>>>> {
    let items = repo::receipts::list_mine(&state.db, user.id).await?;
    Ok(ApiResponse::ok(items, "My receipts"))
}

/// GET /api/receipts/:id
///
/// Owner or admin only.
async fn get_receipt(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<ReceiptDetail>>> {
    let id = parse_id(&id)?;
    let detail = repo::receipts::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Receipt not found".to_string()))?;

    if user.role != Role::Admin && detail.booking.user.id != user.id {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    Ok(ApiResponse::ok(detail, "Receipt"))
}

/// GET /api/receipts/:id/pdf
///
/// Owner or admin only; the ownership check is re-derived from the
/// booking's user reference. Streams the rendered PDF as an attachment.
async fn download_receipt_pdf(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let receipt = repo::receipts::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Receipt not found".to_string()))?;

    let booking = repo::bookings::find(&state.db, receipt.booking_ref)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;

    if user.role != Role::Admin && booking.user_ref != user.id {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    let package = repo::packages::find(&state.db, booking.package_ref).await?;
    let owner = repo::users::find_by_id(&state.db, booking.user_ref)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("booking owner missing")))?;

    let bytes = render_receipt(&ReceiptPdf {
        receipt: &receipt,
        booking: &booking,
        package: package.as_ref(),
        user: &owner,
    })
    .map_err(ApiError::Internal)?;

    let filename = format!("attachment; filename=\"receipt-{}.pdf\"", receipt.receipt_no);
    Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_DISPOSITION, filename)
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Internal(e.into()))
}

/// GET /api/receipts (admin)
async fn list_all_receipts(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ApiResponse<Vec<ReceiptDetail>>>> {
    let (items, total, page) = repo::receipts::list_all(&state.db, &params).await?;
    Ok(ApiResponse::paginated(
        items,
        "Receipts",
        Meta::new(page.page, page.limit, total),
    ))
}

/// Fixed CSV column order for the export.
const CSV_COLUMNS: [&str; 10] = [
    "receiptNo",
    "amount",
    "currency",
    "paymentMethod",
    "paymentStatus",
    "issuedAt",
    "bookingId",
    "customerName",
    "customerEmail",
    "packageTitle",
];

/// Serializes receipts to CSV text with the fixed column order.
fn receipts_to_csv(items: &[ReceiptDetail]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS)?;

    for item in items {
        writer.write_record(&[
            item.receipt.receipt_no.clone(),
            item.receipt.amount.to_string(),
            item.receipt.currency.clone(),
            item.receipt.payment_method.clone(),
            item.receipt.payment_status.to_string(),
            item.receipt.issued_at.to_rfc3339(),
            item.booking.id.to_string(),
            item.booking.user.name.clone(),
            item.booking.user.email.clone(),
            item.booking
                .package
                .as_ref()
                .map(|p| p.title.clone())
                .unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("CSV writer flush failed: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}

/// GET /api/receipts/export/csv (admin)
///
/// Optional from/to filter on the issue date; responds with a file
/// attachment.
async fn export_receipts_csv(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    let items = repo::receipts::list_for_export(&state.db, &params).await?;
    let csv = receipts_to_csv(&items).map_err(ApiError::Internal)?;

    Response::builder()
        .header(header::CONTENT_TYPE, "text/csv")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"receipts.csv\"",
        )
        .body(Body::from(csv))
        .map_err(|e| ApiError::Internal(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::{
        PaymentStatus, Receipt, ReceiptBookingDetail, ReceiptCustomer, ReceiptPackage,
        PAYMENT_METHOD_PAY_LATER,
    };
    use crate::models::BookingStatus;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn sample_detail() -> ReceiptDetail {
        let issued = Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap();
        let booking_id = Uuid::new_v4();
        ReceiptDetail {
            receipt: Receipt {
                id: Uuid::new_v4(),
                booking_ref: booking_id,
                receipt_no: "LT-123456-ABC123".to_string(),
                amount: Decimal::new(300000, 2),
                currency: "LKR".to_string(),
                payment_method: PAYMENT_METHOD_PAY_LATER.to_string(),
                payment_status: PaymentStatus::Unpaid,
                issued_at: issued,
                created_at: issued,
                updated_at: issued,
            },
            booking: ReceiptBookingDetail {
                id: booking_id,
                date: NaiveDate::from_ymd_opt(2025, 12, 24).unwrap(),
                travelers: 3,
                pickup_city: "Colombo".to_string(),
                status: BookingStatus::Pending,
                total_price: Decimal::new(300000, 2),
                user: ReceiptCustomer {
                    id: Uuid::new_v4(),
                    name: "Amal Perera".to_string(),
                    email: "amal@example.com".to_string(),
                    role: crate::models::Role::Customer,
                },
                package: Some(ReceiptPackage {
                    id: Uuid::new_v4(),
                    title: "Southern Coast Escape".to_string(),
                    price: Decimal::new(100000, 2),
                    duration_days: 4,
                    category: "Beach".to_string(),
                    region: "Southern".to_string(),
                }),
            },
        }
    }

    #[test]
    fn csv_has_fixed_header_order() {
        let csv = receipts_to_csv(&[]).unwrap();
        assert_eq!(
            csv.trim_end(),
            "receiptNo,amount,currency,paymentMethod,paymentStatus,issuedAt,\
             bookingId,customerName,customerEmail,packageTitle"
        );
    }

    #[test]
    fn csv_rows_flatten_receipt_and_booking_fields() {
        let detail = sample_detail();
        let csv = receipts_to_csv(&[detail]).unwrap();
        let lines: Vec<&str> = csv.trim_end().lines().collect();
        assert_eq!(lines.len(), 2);

        let row = lines[1];
        assert!(row.starts_with("LT-123456-ABC123,3000.00,LKR,PAY_LATER,UNPAID,"));
        assert!(row.contains("Amal Perera"));
        assert!(row.contains("Southern Coast Escape"));
    }

    #[test]
    fn csv_leaves_deleted_package_title_empty() {
        let mut detail = sample_detail();
        detail.booking.package = None;
        let csv = receipts_to_csv(&[detail]).unwrap();
        assert!(csv.trim_end().ends_with(','));
    }
}
