use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{BookingStatus, Role};

/// The only payment method implemented today. Receipts are issued against
/// it at booking time; no funds are captured.
pub const PAYMENT_METHOD_PAY_LATER: &str = "PAY_LATER";

/// Payment status of a receipt, updated by the (future) payment gateway
/// integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "UNPAID"),
            PaymentStatus::Paid => write!(f, "PAID"),
            PaymentStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPAID" => Ok(PaymentStatus::Unpaid),
            "PAID" => Ok(PaymentStatus::Paid),
            "FAILED" => Ok(PaymentStatus::Failed),
            _ => Err(()),
        }
    }
}

/// Receipt model mapping to the `receipts` table.
///
/// Exactly one receipt exists per booking; it is issued in the same
/// transaction that creates the booking. `amount` is frozen at issuance.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: Uuid,

    /// The booking this receipt settles (1:1, unique)
    pub booking_ref: Uuid,

    /// Globally unique generated receipt number
    pub receipt_no: String,

    /// Copied from the booking's total price at issuance
    pub amount: Decimal,

    pub currency: String,

    /// Open-ended: `PAY_LATER` today, gateway methods later
    pub payment_method: String,

    pub payment_status: PaymentStatus,

    pub issued_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Generates a receipt number: `LT-` + last 6 digits of the millisecond
/// timestamp + 6 random base-36 uppercase characters.
///
/// Collisions are astronomically unlikely; the unique constraint on
/// `receipt_no` turns one into a creation failure rather than a silent
/// duplicate.
pub fn make_receipt_no() -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    let millis = Utc::now().timestamp_millis().to_string();
    let tail = &millis[millis.len().saturating_sub(6)..];

    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!("LT-{tail}-{suffix}")
}

/// Booking context resolved for `GET /receipts/me`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyReceiptBooking {
    pub id: Uuid,
    pub date: NaiveDate,
    pub travelers: i32,
    pub pickup_city: String,
    pub status: BookingStatus,
    pub package_title: Option<String>,
}

/// A receipt with its booking and package title resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyReceipt {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub booking: MyReceiptBooking,
}

/// Customer display fields nested in a fully populated receipt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptCustomer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Package display fields nested in a fully populated receipt. Absent when
/// the package was deleted after booking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPackage {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub duration_days: i32,
    pub category: String,
    pub region: String,
}

/// Booking context with owner and package resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptBookingDetail {
    pub id: Uuid,
    pub date: NaiveDate,
    pub travelers: i32,
    pub pickup_city: String,
    pub status: BookingStatus,
    pub total_price: Decimal,
    pub user: ReceiptCustomer,
    pub package: Option<ReceiptPackage>,
}

/// A fully populated receipt, used for the single-item endpoint and the
/// admin list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDetail {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub booking: ReceiptBookingDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_no_has_expected_shape() {
        let no = make_receipt_no();
        assert_eq!(no.len(), 16);
        assert!(no.starts_with("LT-"));

        let parts: Vec<&str> = no.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn receipt_nos_differ_across_calls() {
        let a = make_receipt_no();
        let b = make_receipt_no();
        assert_ne!(a, b);
    }

    #[test]
    fn payment_status_parses_exact_uppercase_only() {
        assert_eq!("PAID".parse(), Ok(PaymentStatus::Paid));
        assert!("paid".parse::<PaymentStatus>().is_err());
        assert!("SETTLED".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn payment_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Unpaid).unwrap(),
            "\"UNPAID\""
        );
    }
}
