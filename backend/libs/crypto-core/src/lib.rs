//! Session token and secret handling shared by Vidboard services

pub mod jwt;
pub mod secret;

pub use jwt::{Claims, JwtError, SessionKeys};
pub use secret::{validate_secret_strength, SecretStrength};
