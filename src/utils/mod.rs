pub mod jwt;
pub mod verification;
