/// Error types for Board Service
///
/// Every failure a handler can produce, with a fixed HTTP status and a
/// stable error code. Internal details are logged, never sent to clients.
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use crypto_core::JwtError;
use error_types::{error_codes, error_types as kinds, ErrorResponse};
use thiserror::Error;
use video_core::{AccessError, RangeError, StorageError, StreamError};

/// Result type for board-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Admin access required")]
    AdminRequired,

    #[error("Not enough permissions")]
    Forbidden,

    #[error("User not found")]
    UserNotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("Permission not found")]
    PermissionNotFound,

    #[error("Video file not found")]
    VideoFileNotFound,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Permission already exists for this user")]
    PermissionExists,

    #[error("{0}")]
    Conflict(String),

    #[error("File too large. Maximum size is {limit_mb}MB")]
    UploadTooLarge { limit_mb: u64 },

    #[error("{0}")]
    UnsupportedFormat(String),

    #[error("Requested range not satisfiable")]
    RangeNotSatisfiable { total: u64 },

    /// Detail stays in the logs; clients get a fixed message
    #[error("Invalid Range header")]
    InvalidRange,

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Blob storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn kind_and_code(&self) -> (&'static str, &'static str) {
        match self {
            AppError::Validation(_) => (kinds::VALIDATION_ERROR, error_codes::VALIDATION_ERROR),
            AppError::BadRequest(_) => (kinds::VALIDATION_ERROR, error_codes::INVALID_REQUEST),
            AppError::InvalidCredentials => {
                (kinds::AUTHENTICATION_ERROR, error_codes::INVALID_CREDENTIALS)
            }
            AppError::Unauthorized(_) => (kinds::AUTHENTICATION_ERROR, error_codes::TOKEN_INVALID),
            AppError::AdminRequired => (kinds::AUTHORIZATION_ERROR, error_codes::ADMIN_REQUIRED),
            AppError::Forbidden => (kinds::AUTHORIZATION_ERROR, error_codes::FORBIDDEN),
            AppError::UserNotFound => (kinds::NOT_FOUND_ERROR, error_codes::USER_NOT_FOUND),
            AppError::PostNotFound => (kinds::NOT_FOUND_ERROR, error_codes::POST_NOT_FOUND),
            AppError::PermissionNotFound => {
                (kinds::NOT_FOUND_ERROR, error_codes::PERMISSION_NOT_FOUND)
            }
            AppError::VideoFileNotFound => {
                (kinds::NOT_FOUND_ERROR, error_codes::VIDEO_FILE_NOT_FOUND)
            }
            AppError::EmailAlreadyRegistered => {
                (kinds::VALIDATION_ERROR, error_codes::USER_ALREADY_EXISTS)
            }
            AppError::PermissionExists => (kinds::CONFLICT_ERROR, error_codes::PERMISSION_EXISTS),
            AppError::Conflict(_) => (kinds::CONFLICT_ERROR, error_codes::CONFLICT),
            AppError::UploadTooLarge { .. } => {
                (kinds::VALIDATION_ERROR, error_codes::UPLOAD_TOO_LARGE)
            }
            AppError::UnsupportedFormat(_) => {
                (kinds::VALIDATION_ERROR, error_codes::UNSUPPORTED_FORMAT)
            }
            AppError::RangeNotSatisfiable { .. } => {
                (kinds::RANGE_ERROR, error_codes::RANGE_NOT_SATISFIABLE)
            }
            AppError::InvalidRange => (kinds::RANGE_ERROR, error_codes::INVALID_RANGE),
            AppError::Database(_) => (kinds::SERVER_ERROR, error_codes::DATABASE_ERROR),
            AppError::Storage(_) => (kinds::SERVER_ERROR, error_codes::STORAGE_ERROR),
            AppError::Internal(_) => (kinds::SERVER_ERROR, error_codes::INTERNAL_SERVER_ERROR),
        }
    }

    /// Message safe to show to clients
    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::EmailAlreadyRegistered
            | AppError::UploadTooLarge { .. }
            | AppError::UnsupportedFormat(_)
            | AppError::InvalidRange => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AdminRequired | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::UserNotFound
            | AppError::PostNotFound
            | AppError::PermissionNotFound
            | AppError::VideoFileNotFound => StatusCode::NOT_FOUND,
            AppError::PermissionExists | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (error_type, code) = self.kind_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        }

        let response = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            &self.public_message(),
            status.as_u16(),
            error_type,
            code,
        );

        let mut builder = HttpResponse::build(status);
        match self {
            AppError::RangeNotSatisfiable { total } => {
                builder.insert_header((header::CONTENT_RANGE, format!("bytes */{}", total)));
            }
            AppError::InvalidCredentials | AppError::Unauthorized(_) => {
                builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
            }
            _ => {}
        }
        builder.json(response)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotFound => AppError::PostNotFound,
            AccessError::Forbidden => AppError::Forbidden,
            AccessError::Store(msg) => AppError::Database(msg),
        }
    }
}

impl From<RangeError> for AppError {
    fn from(err: RangeError) -> Self {
        match err {
            RangeError::NotSatisfiable { total } => AppError::RangeNotSatisfiable { total },
            RangeError::Malformed(detail) => {
                tracing::debug!(detail = %detail, "malformed range header");
                AppError::InvalidRange
            }
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::VideoFileNotFound,
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<StreamError> for AppError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Access(e) => e.into(),
            StreamError::Range(e) => e.into(),
            StreamError::BlobMissing { .. } => AppError::VideoFileNotFound,
            StreamError::Storage(e) => e.into(),
        }
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired | JwtError::Invalid(_) | JwtError::InvalidSubject => {
                AppError::Unauthorized("Could not validate credentials".to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
