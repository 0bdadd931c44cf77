/// Configuration management for board-service
///
/// Loads configuration from environment variables. Optional values fall back
/// to defaults; malformed values and a missing or weak JWT secret are errors.
use crypto_core::secret::{validate_secret_strength, SecretStrength};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use video_core::constants::{DEFAULT_CHUNK_SIZE, MAX_VIDEO_SIZE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("JWT_SECRET is too weak; use at least 32 random bytes")]
    WeakSecret,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
}

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub cookie_secure: bool,
    pub bootstrap_admin_email: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("cookie_secure", &self.cookie_secure)
            .field("bootstrap_admin_email", &self.bootstrap_admin_email)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub stream_chunk_size: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        match validate_secret_strength(&jwt_secret) {
            SecretStrength::Weak => return Err(ConfigError::WeakSecret),
            SecretStrength::Acceptable => {
                tracing::warn!("JWT_SECRET is acceptable but shorter than recommended (64 bytes)")
            }
            SecretStrength::Strong => {}
        }

        let access_token_ttl_minutes: i64 =
            parse_or(var("ACCESS_TOKEN_TTL_MINUTES"), "ACCESS_TOKEN_TTL_MINUTES", 30)?;
        if access_token_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: "ACCESS_TOKEN_TTL_MINUTES",
                value: access_token_ttl_minutes.to_string(),
            });
        }

        let stream_chunk_size: usize =
            parse_or(var("STREAM_CHUNK_SIZE"), "STREAM_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        if stream_chunk_size == 0 {
            return Err(ConfigError::Invalid {
                name: "STREAM_CHUNK_SIZE",
                value: "0".to_string(),
            });
        }

        Ok(Config {
            app: AppConfig {
                host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(var("APP_PORT"), "APP_PORT", 8000)?,
                env: var("APP_ENV").unwrap_or_else(|| "development".to_string()),
            },
            cors: CorsConfig {
                allowed_origins: var("CORS_ALLOWED_ORIGINS")
                    .map(|raw| {
                        raw.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]),
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_or(
                    var("DATABASE_MAX_CONNECTIONS"),
                    "DATABASE_MAX_CONNECTIONS",
                    10,
                )?,
            },
            auth: AuthConfig {
                jwt_secret,
                access_token_ttl_minutes,
                cookie_secure: parse_bool(var("COOKIE_SECURE"), "COOKIE_SECURE", false)?,
                bootstrap_admin_email: var("BOOTSTRAP_ADMIN_EMAIL")
                    .map(|email| email.trim().to_lowercase()),
            },
            media: MediaConfig {
                upload_dir: var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./uploads/videos")),
                max_upload_bytes: parse_or(var("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES", MAX_VIDEO_SIZE)?,
                stream_chunk_size,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn parse_bool(raw: Option<String>, name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(value) => Err(ConfigError::Invalid { name, value }),
    }
}
