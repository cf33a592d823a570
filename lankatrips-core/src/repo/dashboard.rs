use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use crate::models::BookingStatus;

/// Aggregate counts and revenue for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_bookings: i64,
    pub pending_bookings: i64,
    pub confirmed_bookings: i64,
    pub completed_bookings: i64,

    /// Sum of receipt amounts with payment status PAID
    pub revenue: Decimal,
}

async fn count_by_status(pool: &PgPool, status: BookingStatus) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE status = $1")
        .bind(status)
        .fetch_one(pool)
        .await
}

/// Computes the dashboard rollup from current persisted state; nothing is
/// cached.
pub async fn stats(pool: &PgPool) -> Result<DashboardStats, sqlx::Error> {
    let total_bookings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(pool)
        .await?;
    let pending_bookings = count_by_status(pool, BookingStatus::Pending).await?;
    let confirmed_bookings = count_by_status(pool, BookingStatus::Confirmed).await?;
    let completed_bookings = count_by_status(pool, BookingStatus::Completed).await?;

    let revenue: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM receipts WHERE payment_status = 'PAID'",
    )
    .fetch_one(pool)
    .await?;

    Ok(DashboardStats {
        total_bookings,
        pending_bookings,
        confirmed_bookings,
        completed_bookings,
        revenue,
    })
}
