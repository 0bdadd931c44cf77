//! Session token issuing and validation
//!
//! Sessions are HS256 JWTs signed with a secret that is injected from
//! configuration at start-up. The secret MUST be stable across restarts:
//! rotating it invalidates every session issued before the rotation.
//!
//! ## Usage
//!
//! ```rust
//! use crypto_core::jwt::SessionKeys;
//! use uuid::Uuid;
//!
//! let keys = SessionKeys::new("0123456789abcdef0123456789abcdef", 30).unwrap();
//! let token = keys.issue(Uuid::new_v4(), "alice@example.com").unwrap();
//! let claims = keys.validate(&token).unwrap();
//! assert_eq!(claims.email, "alice@example.com");
//! ```
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Minimum secret length in bytes (256 bits)
pub const MIN_SECRET_LENGTH: usize = 32;

/// Session lifetime used when none is configured
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// Session claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Email address at issue time
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidSubject)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("JWT secret too short: {0} bytes, need at least {MIN_SECRET_LENGTH}")]
    SecretTooShort(usize),

    #[error("Token lifetime must be positive")]
    InvalidTtl,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token subject is not a user id")]
    InvalidSubject,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

// ============================================================================
// Key Material
// ============================================================================

/// Signing and verification keys plus session lifetime
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl_minutes", &self.ttl.num_minutes())
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    /// Build keys from a shared secret.
    ///
    /// ## Errors
    ///
    /// - `SecretTooShort` if the secret is under 32 bytes
    /// - `InvalidTtl` if `ttl_minutes` is not positive
    pub fn new(secret: &str, ttl_minutes: i64) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(JwtError::SecretTooShort(secret.len()));
        }
        if ttl_minutes <= 0 {
            return Err(JwtError::InvalidTtl);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        })
    }

    /// Session lifetime in seconds (also the cookie Max-Age)
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    // ========================================================================
    // Token Generation
    // ========================================================================

    /// Issue a session token for a user
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(JWT_ALGORITHM), claims, &self.encoding)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    // ========================================================================
    // Token Validation
    // ========================================================================

    /// Validate signature and expiry, returning the claims.
    ///
    /// Only HS256 is accepted; tokens signed with any other algorithm fail.
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })
    }

    /// Validate a token and extract its user id
    pub fn user_id(&self, token: &str) -> Result<Uuid, JwtError> {
        self.validate(token)?.user_id()
    }
}

// ============================================================================
// Tests
// ============================================================================
