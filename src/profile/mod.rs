// src/profile/mod.rs

pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;
pub mod validators;


pub use routes::profile_routes;
pub use store::{ProfileError, ProfileStore, SqliteProfileStore};
