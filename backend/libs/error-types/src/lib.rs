//! Shared API error envelope for Vidboard services

use serde::{Deserialize, Serialize};

/// Unified API error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Reason phrase of the HTTP status ("Not Found", "Forbidden", ...)
    pub error: String,

    /// Human readable message
    pub message: String,

    /// HTTP status code
    pub status: u16,

    /// Error class for client-side routing, one of [`error_types`]
    #[serde(rename = "type")]
    pub error_type: String,

    /// Machine-stable code, one of [`error_codes`]
    pub code: String,

    /// Request correlation id, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            trace_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

/// Stable error codes
pub mod error_codes {
    // Users / sessions
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const USER_ALREADY_EXISTS: &str = "USER_ALREADY_EXISTS";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const TOKEN_INVALID: &str = "TOKEN_INVALID";
    pub const ADMIN_REQUIRED: &str = "ADMIN_REQUIRED";

    // Posts / permissions
    pub const POST_NOT_FOUND: &str = "POST_NOT_FOUND";
    pub const PERMISSION_NOT_FOUND: &str = "PERMISSION_NOT_FOUND";
    pub const PERMISSION_EXISTS: &str = "PERMISSION_EXISTS";
    pub const FORBIDDEN: &str = "FORBIDDEN";

    // Media
    pub const VIDEO_FILE_NOT_FOUND: &str = "VIDEO_FILE_NOT_FOUND";
    pub const UPLOAD_TOO_LARGE: &str = "UPLOAD_TOO_LARGE";
    pub const UNSUPPORTED_FORMAT: &str = "UNSUPPORTED_FORMAT";
    pub const RANGE_NOT_SATISFIABLE: &str = "RANGE_NOT_SATISFIABLE";
    pub const INVALID_RANGE: &str = "INVALID_RANGE";

    // Generic
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const CONFLICT: &str = "CONFLICT";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
}

/// Error classes
pub mod error_types {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const AUTHENTICATION_ERROR: &str = "authentication_error";
    pub const AUTHORIZATION_ERROR: &str = "authorization_error";
    pub const NOT_FOUND_ERROR: &str = "not_found_error";
    pub const CONFLICT_ERROR: &str = "conflict_error";
    pub const RANGE_ERROR: &str = "range_error";
    pub const SERVER_ERROR: &str = "server_error";
}
