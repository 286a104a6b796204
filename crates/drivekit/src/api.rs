//! The seam between drivekit and the remote storage service.
//!
//! [`DriveApi`] exposes the service with plain request/response semantics.
//! Authentication, transport retries and timeouts live behind it, in
//! [`crate::HttpDriveApi`] for the real service or in a test double.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::Result;

/// Parameters of a single `files.list` page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// Filter expression in the service's query grammar.
    pub query: String,
    /// Number of records requested for this page (1..=1000).
    pub page_size: u32,
    /// Continuation token from the previous page, if any.
    pub page_token: Option<String>,
    /// Include results from shared drives as well as the personal root.
    pub all_drives: bool,
}

/// One page of `files.list` results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Raw file metadata as returned by the service.
///
/// Everything but `id` may be missing or null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub modified_time: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub owners: Option<Vec<OwnerRecord>>,
    #[serde(default)]
    pub capabilities: Option<CapabilitiesRecord>,
    #[serde(default)]
    pub properties: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub app_properties: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub export_links: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRecord {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesRecord {
    #[serde(default)]
    pub can_edit: Option<bool>,
    #[serde(default)]
    pub can_comment: Option<bool>,
    #[serde(default)]
    pub can_view: Option<bool>,
}

/// The authenticated user, from `about.get`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub permission_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}

/// A shared drive, from `drives.list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrivePage {
    #[serde(default)]
    pub drives: Vec<DriveRecord>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRecord {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedContentRecord {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRecord {
    pub id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<AuthorRecord>,
    pub created_time: String,
    pub modified_time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<AuthorRecord>,
    pub created_time: String,
    pub modified_time: String,
    #[serde(default)]
    pub quoted_file_content: Option<QuotedContentRecord>,
    #[serde(default)]
    pub resolved: Option<bool>,
    #[serde(default)]
    pub anchor: Option<String>,
    #[serde(default)]
    pub replies: Vec<ReplyRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Request/response view of the remote drive service.
///
/// Implementations must be thread-safe (`Send + Sync`). Every method maps a
/// single remote call; pagination, traversal and search are built on top of
/// [`DriveApi::list_files`] by the rest of the crate.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Fetches one page of files matching `request.query`.
    async fn list_files(&self, request: &ListRequest) -> Result<FilePage>;

    /// Fetches the metadata of one file.
    async fn get_file(&self, file_id: &str) -> Result<FileRecord>;

    /// Fetches the authenticated user.
    async fn about(&self) -> Result<UserRecord>;

    /// Fetches one page of shared drives.
    async fn list_drives(&self, page_token: Option<&str>) -> Result<DrivePage>;

    /// Patches file metadata and returns the service's echo of it.
    async fn update_file(&self, file_id: &str, body: &JsonValue) -> Result<FileRecord>;

    /// Downloads the raw content of a binary file.
    async fn download(&self, file_id: &str) -> Result<Vec<u8>>;

    /// Exports a structured document to `mime_type`.
    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>>;

    /// Fetches one page of non-deleted comments on a file.
    async fn list_comments(&self, file_id: &str, page_token: Option<&str>) -> Result<CommentPage>;

    /// Replies to a comment and returns the new reply's id.
    async fn create_reply(&self, file_id: &str, comment_id: &str, content: &str) -> Result<String>;

    /// Lists the labels applied to a file.
    async fn list_labels(&self, file_id: &str) -> Result<Vec<JsonValue>>;
}
