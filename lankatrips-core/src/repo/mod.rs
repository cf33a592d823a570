//! SQL access, one module per aggregate. Functions take a pool (or join a
//! transaction) and return plain `sqlx::Error`; the handler layer converts
//! into `ApiError` (unique violations become 409s there).

pub mod bookings;
pub mod dashboard;
pub mod locations;
pub mod packages;
pub mod receipts;
pub mod users;

#[cfg(test)]
mod tests;
