/// Clip Service Library
///
/// REST backend for a video-sharing platform: videos, comments, likes,
/// subscriptions, tweets, playlists and channel dashboards.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route glue
/// - `models`: Row types and view projections
/// - `services`: Business logic (toggles, aggregation, media relay)
/// - `db`: Database pool and repositories
/// - `middleware`: Bearer-token authentication
/// - `security`: Password hashing and JWT issuance
/// - `response`: The uniform response envelope
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod security;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
