//! # Auth Module
//!
//! Bearer-token authentication for protected routes. Tokens are issued
//! elsewhere; this module only validates them and resolves the user row.

pub mod extractors;
pub mod models;


pub use extractors::AuthedUser;
pub use models::User;
