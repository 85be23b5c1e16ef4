//! Store-facing operations. Handlers stay thin and call into these; tests
//! drive them directly against a migrated database.

pub mod bookings;
pub mod favorites;
pub mod listings;
pub mod partners;
pub mod travelers;
pub mod users;
