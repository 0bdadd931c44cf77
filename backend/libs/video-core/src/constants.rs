//! Video board constants

/// Maximum video file size (500 MB)
pub const MAX_VIDEO_SIZE: u64 = 500 * 1024 * 1024;

/// Maximum post title length
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum post description length
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Allowed video file extensions (lowercase, with leading dot)
pub const ALLOWED_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".mov"];

/// Default size of a streamed chunk (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Fallback content type for unknown extensions
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Extension to content type table used when streaming
pub const VIDEO_CONTENT_TYPES: &[(&str, &str)] = &[
    (".mp4", "video/mp4"),
    (".webm", "video/webm"),
    (".mov", "video/quicktime"),
];
