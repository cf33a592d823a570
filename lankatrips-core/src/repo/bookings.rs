use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::booking::{
    compute_total_price, AdminBooking, BookedPackage, BookedPackageSummary, BookingOwner,
    BookingWithPackage, CreateBooking,
};
use crate::models::receipt::{make_receipt_no, PAYMENT_METHOD_PAY_LATER};
use crate::models::{Booking, BookingStatus, Package, Receipt, Role};
use crate::query::{push_eq_filters, push_page, push_search, PageParams};

const COLUMNS: &str = "id, user_ref, package_ref, date, travelers, pickup_city, phone, \
                       total_price, status, created_at, updated_at";

const PREFIXED_COLUMNS: &str =
    "b.id, b.user_ref, b.package_ref, b.date, b.travelers, b.pickup_city, b.phone, \
     b.total_price, b.status, b.created_at, b.updated_at";

const RECEIPT_COLUMNS: &str = "id, booking_ref, receipt_no, amount, currency, payment_method, \
                               payment_status, issued_at, created_at, updated_at";

const DEFAULT_LIMIT: i64 = 20;

/// Creates a booking and issues its receipt in a single transaction.
///
/// The receipt is written with the booking's frozen total price and the
/// configured default currency; if either insert fails (including a
/// receipt-number collision on the unique index) the whole operation rolls
/// back, so a booking can never exist without its receipt.
pub async fn create_with_receipt(
    pool: &PgPool,
    user_id: Uuid,
    package: &Package,
    date: NaiveDate,
    req: &CreateBooking,
    currency: &str,
) -> Result<(Booking, Receipt), sqlx::Error> {
    let total_price = compute_total_price(package.price, req.travelers);

    let mut tx = pool.begin().await?;

    let booking = sqlx::query_as::<_, Booking>(&format!(
        "INSERT INTO bookings (id, user_ref, package_ref, date, travelers, pickup_city, phone, total_price) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(package.id)
    .bind(date)
    .bind(req.travelers)
    .bind(req.pickup_city.trim())
    .bind(req.phone.trim())
    .bind(total_price)
    .fetch_one(&mut *tx)
    .await?;

    let receipt = sqlx::query_as::<_, Receipt>(&format!(
        "INSERT INTO receipts (id, booking_ref, receipt_no, amount, currency, payment_method) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {RECEIPT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(booking.id)
    .bind(make_receipt_no())
    .bind(booking.total_price)
    .bind(currency)
    .bind(PAYMENT_METHOD_PAY_LATER)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((booking, receipt))
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as::<_, Booking>(&format!("SELECT {COLUMNS} FROM bookings WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[derive(FromRow)]
struct MyBookingRow {
    #[sqlx(flatten)]
    booking: Booking,
    pkg_id: Option<Uuid>,
    pkg_title: Option<String>,
    pkg_price: Option<Decimal>,
    pkg_duration_days: Option<i32>,
    pkg_category: Option<String>,
    pkg_region: Option<String>,
    pkg_images: Option<Vec<String>>,
}

/// All bookings owned by a user, newest first, with the booked package's
/// display fields resolved (absent when the package was deleted).
pub async fn list_mine(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<BookingWithPackage>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MyBookingRow>(&format!(
        "SELECT {PREFIXED_COLUMNS}, \
         p.id AS pkg_id, p.title AS pkg_title, p.price AS pkg_price, \
         p.duration_days AS pkg_duration_days, p.category AS pkg_category, \
         p.region AS pkg_region, p.images AS pkg_images \
         FROM bookings b LEFT JOIN packages p ON p.id = b.package_ref \
         WHERE b.user_ref = $1 ORDER BY b.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let package = row.pkg_id.map(|id| BookedPackage {
                id,
                title: row.pkg_title.unwrap_or_default(),
                price: row.pkg_price.unwrap_or_default(),
                duration_days: row.pkg_duration_days.unwrap_or_default(),
                category: row.pkg_category.unwrap_or_default(),
                region: row.pkg_region.unwrap_or_default(),
                images: row.pkg_images.unwrap_or_default(),
            });
            BookingWithPackage {
                booking: row.booking,
                package,
            }
        })
        .collect())
}

#[derive(FromRow)]
struct AdminBookingRow {
    #[sqlx(flatten)]
    booking: Booking,
    user_name: String,
    user_email: String,
    user_role: Role,
    pkg_id: Option<Uuid>,
    pkg_title: Option<String>,
    pkg_price: Option<Decimal>,
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, params: &HashMap<String, String>) {
    push_eq_filters(qb, params, &[("status", "b.status")]);
    // Free-text search is scoped to the pickup city.
    push_search(qb, params, &["b.pickup_city"]);
}

/// Admin list: filtered, paginated, with owner and package resolved.
pub async fn list_all(
    pool: &PgPool,
    params: &HashMap<String, String>,
) -> Result<(Vec<AdminBooking>, i64, PageParams), sqlx::Error> {
    let page = PageParams::from_query(params, DEFAULT_LIMIT);

    let mut qb = QueryBuilder::new(format!(
        "SELECT {PREFIXED_COLUMNS}, \
         u.name AS user_name, u.email AS user_email, u.role AS user_role, \
         p.id AS pkg_id, p.title AS pkg_title, p.price AS pkg_price \
         FROM bookings b \
         JOIN users u ON u.id = b.user_ref \
         LEFT JOIN packages p ON p.id = b.package_ref \
         WHERE 1=1"
    ));
    apply_filters(&mut qb, params);
    qb.push(" ORDER BY b.created_at DESC");
    push_page(&mut qb, &page);
    let rows = qb.build_query_as::<AdminBookingRow>().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM bookings b WHERE 1=1");
    apply_filters(&mut count_qb, params);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let items = rows
        .into_iter()
        .map(|row| {
            let package = row.pkg_id.map(|id| BookedPackageSummary {
                id,
                title: row.pkg_title.unwrap_or_default(),
                price: row.pkg_price.unwrap_or_default(),
            });
            let user = BookingOwner {
                id: row.booking.user_ref,
                name: row.user_name,
                email: row.user_email,
                role: row.user_role,
            };
            AdminBooking {
                booking: row.booking,
                user,
                package,
            }
        })
        .collect();

    Ok((items, total, page))
}

/// Persists a new status. No receipt side effects.
pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    status: BookingStatus,
) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as::<_, Booking>(&format!(
        "UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(status)
    .fetch_optional(pool)
    .await
}
