//! # Actix Middleware Library
//!
//! Shared middleware for the Vidboard actix services
//!
//! ## Modules
//! - `jwt_auth`: cookie/Bearer JWT session middleware
//! - `metrics`: Prometheus HTTP metrics middleware

pub mod jwt_auth;
pub mod metrics;

pub use jwt_auth::{extract_token, JwtAuthMiddleware, Unauthenticated, UserId, SESSION_COOKIE};
pub use metrics::{render_metrics, MetricsMiddleware};
