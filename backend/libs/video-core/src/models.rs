//! Core video board data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// The authenticated caller of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub is_admin: bool,
}

impl Identity {
    pub fn new(id: Uuid, is_admin: bool) -> Self {
        Self { id, is_admin }
    }
}

/// A posted video asset and its access policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub is_public: bool,
    /// Key of the stored blob (e.g. `3f1c...e2.mp4`)
    pub storage_key: String,
    /// File name as uploaded by the owner
    pub original_name: String,
    pub byte_length: u64,
}

impl Resource {
    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.owner_id == identity.id
    }
}

/// Kind of permission carried by a grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantType {
    Read,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::Read => "read",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(GrantType::Read),
            _ => None,
        }
    }
}

impl Default for GrantType {
    fn default() -> Self {
        GrantType::Read
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit read permission extended to a non-owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub resource_id: Uuid,
    pub identity_id: Uuid,
    pub grant_type: GrantType,
}

/// Inclusive byte interval into a resource: `start <= end < total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` response header
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// Lowercased extension of a file name including the leading dot
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}
