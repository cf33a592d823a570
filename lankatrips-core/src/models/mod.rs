pub mod booking;
pub mod location;
pub mod package;
pub mod receipt;
pub mod user;

pub use booking::{Booking, BookingStatus};
pub use location::Location;
pub use package::Package;
pub use receipt::{PaymentStatus, Receipt};
pub use user::{Role, User};

/// Split a comma-separated input into trimmed, non-empty entries.
///
/// Used for tag lists and location-reference lists submitted as plain text.
pub fn split_commas(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a newline-separated input into trimmed, non-empty lines.
///
/// Used for itinerary / includes / excludes text areas.
pub fn split_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_commas_trims_and_drops_empty() {
        assert_eq!(
            split_commas(" beach , culture ,, wildlife ,"),
            vec!["beach", "culture", "wildlife"]
        );
        assert_eq!(split_commas(""), Vec::<String>::new());
    }

    #[test]
    fn split_lines_handles_crlf_and_blank_lines() {
        assert_eq!(
            split_lines("Day 1: Arrival\r\n\r\n  Day 2: Safari  \n"),
            vec!["Day 1: Arrival", "Day 2: Safari"]
        );
    }
}
