// src/profile/handlers/mod.rs

pub mod profile;
