//! Gallery - art gallery backend
//!
//! Artworks, comments, user profiles and admin management behind a
//! cookie-session REST API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
