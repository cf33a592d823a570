use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::receipt::{
    MyReceipt, MyReceiptBooking, ReceiptBookingDetail, ReceiptCustomer, ReceiptDetail,
    ReceiptPackage,
};
use crate::models::{BookingStatus, Receipt, Role};
use crate::query::{push_eq_filters, push_page, PageParams};

const COLUMNS: &str = "id, booking_ref, receipt_no, amount, currency, payment_method, \
                       payment_status, issued_at, created_at, updated_at";

const PREFIXED_COLUMNS: &str =
    "r.id, r.booking_ref, r.receipt_no, r.amount, r.currency, r.payment_method, \
     r.payment_status, r.issued_at, r.created_at, r.updated_at";

const DEFAULT_LIMIT: i64 = 20;

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Receipt>, sqlx::Error> {
    sqlx::query_as::<_, Receipt>(&format!("SELECT {COLUMNS} FROM receipts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[derive(FromRow)]
struct MyReceiptRow {
    #[sqlx(flatten)]
    receipt: Receipt,
    b_id: Uuid,
    b_date: NaiveDate,
    b_travelers: i32,
    b_pickup_city: String,
    b_status: BookingStatus,
    pkg_title: Option<String>,
}

/// Receipts belonging to a user, newest-issued first.
///
/// Receipts do not reference users directly, so this is a two-step join:
/// resolve the user's booking ids, then the receipts issued against them.
pub async fn list_mine(pool: &PgPool, user_id: Uuid) -> Result<Vec<MyReceipt>, sqlx::Error> {
    let booking_ids: Vec<Uuid> =
        sqlx::query_scalar("SELECT id FROM bookings WHERE user_ref = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    if booking_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, MyReceiptRow>(&format!(
        "SELECT {PREFIXED_COLUMNS}, \
         b.id AS b_id, b.date AS b_date, b.travelers AS b_travelers, \
         b.pickup_city AS b_pickup_city, b.status AS b_status, \
         p.title AS pkg_title \
         FROM receipts r \
         JOIN bookings b ON b.id = r.booking_ref \
         LEFT JOIN packages p ON p.id = b.package_ref \
         WHERE r.booking_ref = ANY($1) \
         ORDER BY r.issued_at DESC"
    ))
    .bind(booking_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| MyReceipt {
            receipt: row.receipt,
            booking: MyReceiptBooking {
                id: row.b_id,
                date: row.b_date,
                travelers: row.b_travelers,
                pickup_city: row.b_pickup_city,
                status: row.b_status,
                package_title: row.pkg_title,
            },
        })
        .collect())
}

#[derive(FromRow)]
struct ReceiptDetailRow {
    #[sqlx(flatten)]
    receipt: Receipt,
    b_id: Uuid,
    b_date: NaiveDate,
    b_travelers: i32,
    b_pickup_city: String,
    b_status: BookingStatus,
    b_total_price: Decimal,
    u_id: Uuid,
    u_name: String,
    u_email: String,
    u_role: Role,
    pkg_id: Option<Uuid>,
    pkg_title: Option<String>,
    pkg_price: Option<Decimal>,
    pkg_duration_days: Option<i32>,
    pkg_category: Option<String>,
    pkg_region: Option<String>,
}

impl From<ReceiptDetailRow> for ReceiptDetail {
    fn from(row: ReceiptDetailRow) -> Self {
        let package = row.pkg_id.map(|id| ReceiptPackage {
            id,
            title: row.pkg_title.unwrap_or_default(),
            price: row.pkg_price.unwrap_or_default(),
            duration_days: row.pkg_duration_days.unwrap_or_default(),
            category: row.pkg_category.unwrap_or_default(),
            region: row.pkg_region.unwrap_or_default(),
        });
        ReceiptDetail {
            receipt: row.receipt,
            booking: ReceiptBookingDetail {
                id: row.b_id,
                date: row.b_date,
                travelers: row.b_travelers,
                pickup_city: row.b_pickup_city,
                status: row.b_status,
                total_price: row.b_total_price,
                user: ReceiptCustomer {
                    id: row.u_id,
                    name: row.u_name,
                    email: row.u_email,
                    role: row.u_role,
                },
                package,
            },
        }
    }
}

const DETAIL_SELECT: &str =
    "SELECT r.id, r.booking_ref, r.receipt_no, r.amount, r.currency, r.payment_method, \
     r.payment_status, r.issued_at, r.created_at, r.updated_at, \
     b.id AS b_id, b.date AS b_date, b.travelers AS b_travelers, \
     b.pickup_city AS b_pickup_city, b.status AS b_status, b.total_price AS b_total_price, \
     u.id AS u_id, u.name AS u_name, u.email AS u_email, u.role AS u_role, \
     p.id AS pkg_id, p.title AS pkg_title, p.price AS pkg_price, \
     p.duration_days AS pkg_duration_days, p.category AS pkg_category, p.region AS pkg_region \
     FROM receipts r \
     JOIN bookings b ON b.id = r.booking_ref \
     JOIN users u ON u.id = b.user_ref \
     LEFT JOIN packages p ON p.id = b.package_ref";

/// Fetches a receipt with its booking, owner and package fully resolved.
pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<ReceiptDetail>, sqlx::Error> {
    let row = sqlx::query_as::<_, ReceiptDetailRow>(&format!("{DETAIL_SELECT} WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(ReceiptDetail::from))
}

/// Parses a `from`/`to` filter value: an RFC 3339 timestamp or a bare date
/// (interpreted as midnight UTC). Unparseable input is treated as absent.
fn parse_issued_bound(value: &str) -> Option<DateTime<Utc>> {
    let raw = value.trim();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            NaiveDate::from_str(raw)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, params: &HashMap<String, String>) {
    push_eq_filters(
        qb,
        params,
        &[
            ("paymentStatus", "r.payment_status"),
            ("paymentMethod", "r.payment_method"),
        ],
    );
    if let Some(from) = params.get("from").and_then(|v| parse_issued_bound(v)) {
        qb.push(" AND r.issued_at >= ");
        qb.push_bind(from);
    }
    if let Some(to) = params.get("to").and_then(|v| parse_issued_bound(v)) {
        qb.push(" AND r.issued_at <= ");
        qb.push_bind(to);
    }
}

/// Admin list: filtered, paginated, fully populated, newest-issued first.
pub async fn list_all(
    pool: &PgPool,
    params: &HashMap<String, String>,
) -> Result<(Vec<ReceiptDetail>, i64, PageParams), sqlx::Error> {
    let page = PageParams::from_query(params, DEFAULT_LIMIT);

    let mut qb = QueryBuilder::new(format!("{DETAIL_SELECT} WHERE 1=1"));
    apply_filters(&mut qb, params);
    qb.push(" ORDER BY r.issued_at DESC");
    push_page(&mut qb, &page);
    let rows = qb
        .build_query_as::<ReceiptDetailRow>()
        .fetch_all(pool)
        .await?;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM receipts r WHERE 1=1");
    apply_filters(&mut count_qb, params);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    Ok((rows.into_iter().map(ReceiptDetail::from).collect(), total, page))
}

/// All receipts matching an optional issued-at range, fully populated,
/// newest-issued first. Used by the CSV export, which is not paginated.
pub async fn list_for_export(
    pool: &PgPool,
    params: &HashMap<String, String>,
) -> Result<Vec<ReceiptDetail>, sqlx::Error> {
    let mut qb = QueryBuilder::new(format!("{DETAIL_SELECT} WHERE 1=1"));
    if let Some(from) = params.get("from").and_then(|v| parse_issued_bound(v)) {
        qb.push(" AND r.issued_at >= ");
        qb.push_bind(from);
    }
    if let Some(to) = params.get("to").and_then(|v| parse_issued_bound(v)) {
        qb.push(" AND r.issued_at <= ");
        qb.push_bind(to);
    }
    qb.push(" ORDER BY r.issued_at DESC");

    let rows = qb
        .build_query_as::<ReceiptDetailRow>()
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(ReceiptDetail::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_bound_accepts_dates_and_timestamps() {
        let midnight = parse_issued_bound("2025-03-01").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2025-03-01T00:00:00+00:00");

        let exact = parse_issued_bound("2025-03-01T10:30:00Z").unwrap();
        assert_eq!(exact.to_rfc3339(), "2025-03-01T10:30:00+00:00");

        assert!(parse_issued_bound("last tuesday").is_none());
    }
}
