pub mod admin;
pub mod auth;
pub mod partner;
pub mod public;
pub mod traveler;
