pub mod admin;
pub mod auth;
pub mod bookings;
pub mod locations;
pub mod packages;
pub mod payments;
pub mod receipts;

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Parses a path id, mapping failure to a 400 inside the standard
/// envelope instead of axum's bare rejection.
pub fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_malformed_input() {
        assert!(parse_id("not-a-uuid").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
