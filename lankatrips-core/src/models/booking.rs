use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::FieldError;
use crate::models::Role;

/// Booking status enumeration.
///
/// New bookings start as `pending`. Transitions are admin-driven and
/// deliberately unconstrained beyond enum membership (admin override).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// Booking model mapping to the `bookings` table.
///
/// `total_price` is computed once at creation (package price x travelers)
/// and never recomputed when the package price changes later.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,

    /// Owning user
    pub user_ref: Uuid,

    /// Booked package (weak reference; the package may be deleted later)
    pub package_ref: Uuid,

    /// Travel date
    pub date: NaiveDate,

    pub travelers: i32,
    pub pickup_city: String,
    pub phone: String,
    pub total_price: Decimal,
    pub status: BookingStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a booking.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    pub package_id: Uuid,

    /// ISO date string; must parse and be today or later
    pub date: String,

    pub travelers: i32,
    pub pickup_city: String,
    pub phone: String,
}

impl CreateBooking {
    /// Validates the request against `today`, returning per-field errors.
    ///
    /// The date check lives here and only here: parseability and the
    /// today-or-future rule are enforced in the same place.
    pub fn validate(&self, today: NaiveDate) -> Result<NaiveDate, Vec<FieldError>> {
        let mut errors = Vec::new();

        let date = match self.parsed_date() {
            Some(date) => {
                if date < today {
                    errors.push(FieldError::new(
                        "body.date",
                        "Travel date must be today or in the future",
                    ));
                }
                Some(date)
            }
            None => {
                errors.push(FieldError::new("body.date", "Invalid date"));
                None
            }
        };

        if self.travelers < 1 {
            errors.push(FieldError::new("body.travelers", "At least 1 traveler required"));
        }
        if self.travelers > 50 {
            errors.push(FieldError::new("body.travelers", "Maximum 50 travelers"));
        }
        if self.pickup_city.trim().len() < 2 {
            errors.push(FieldError::new("body.pickupCity", "Pickup city is required"));
        }
        if self.phone.trim().len() < 5 {
            errors.push(FieldError::new("body.phone", "Valid phone number is required"));
        }

        match (errors.is_empty(), date) {
            (true, Some(date)) => Ok(date),
            _ => Err(errors),
        }
    }

    fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.trim();
        NaiveDate::from_str(raw)
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }
}

/// Total price of a booking: package price times traveler count, exact
/// decimal arithmetic, frozen at creation time.
pub fn compute_total_price(package_price: Decimal, travelers: i32) -> Decimal {
    package_price * Decimal::from(travelers)
}

/// Request body for the admin status-update endpoint.
///
/// The status arrives as a raw string so an out-of-enum value can be
/// rejected with a field error instead of a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingStatus {
    pub status: String,
}

/// Ids handed back after a successful booking + receipt issuance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreated {
    pub booking_id: Uuid,
    pub receipt_id: Uuid,
}

/// Display fields of the booked package, resolved for `GET /bookings/me`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedPackage {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub duration_days: i32,
    pub category: String,
    pub region: String,
    pub images: Vec<String>,
}

/// A booking with its package display fields resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithPackage {
    #[serde(flatten)]
    pub booking: Booking,
    pub package: Option<BookedPackage>,
}

/// Owner display fields resolved for the admin list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingOwner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Package price/title pair resolved for the admin list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedPackageSummary {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
}

/// A booking with owner and package resolved, for `GET /bookings` (admin).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub user: BookingOwner,
    pub package: Option<BookedPackageSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request(date: &str) -> CreateBooking {
        CreateBooking {
            package_id: Uuid::new_v4(),
            date: date.to_string(),
            travelers: 3,
            pickup_city: "Colombo".to_string(),
            phone: "+94771234567".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn accepts_today_and_future_dates() {
        assert!(base_request("2025-06-01").validate(today()).is_ok());
        assert!(base_request("2025-12-24").validate(today()).is_ok());
    }

    #[test]
    fn rejects_past_and_unparseable_dates() {
        let errors = base_request("2025-05-31").validate(today()).unwrap_err();
        assert_eq!(errors[0].path, "body.date");

        let errors = base_request("not-a-date").validate(today()).unwrap_err();
        assert_eq!(errors[0].message, "Invalid date");
    }

    #[test]
    fn rejects_traveler_counts_outside_bounds() {
        let mut req = base_request("2025-06-02");
        req.travelers = 0;
        assert!(req.validate(today()).is_err());

        req.travelers = 51;
        let errors = req.validate(today()).unwrap_err();
        assert_eq!(errors[0].message, "Maximum 50 travelers");

        req.travelers = 50;
        assert!(req.validate(today()).is_ok());
    }

    #[test]
    fn total_price_is_price_times_travelers() {
        let price = Decimal::new(100000, 2); // 1000.00
        assert_eq!(compute_total_price(price, 3), Decimal::new(300000, 2));
        assert_eq!(compute_total_price(price, 1), price);

        let fractional = Decimal::new(99950, 2); // 999.50
        assert_eq!(compute_total_price(fractional, 2), Decimal::new(199900, 2));
    }

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("confirmed".parse(), Ok(BookingStatus::Confirmed));
        assert!("shipped".parse::<BookingStatus>().is_err());
        assert!("Pending".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn status_round_trips_through_display() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse(), Ok(status));
        }
    }
}
