//! Board Service
//!
//! Video message board: accounts, video posts with per-post read grants,
//! and byte-range streaming of the uploaded files.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod state;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
