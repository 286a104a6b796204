//! In-memory [`DriveApi`] double for unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::{
    DriveError, Result,
    api::{
        CommentPage, CommentRecord, DriveApi, DrivePage, DriveRecord, FilePage, FileRecord,
        ListRequest, UserRecord,
    },
    model::FOLDER_MIME_TYPE,
    query::children_filter,
};

/// Serves canned listings keyed by query string and records every request.
///
/// Page tokens are the offset of the next record, so pagination is served
/// exactly as requested (optionally capped by `page_cap`, which simulates a
/// server returning short pages).
#[derive(Debug, Default)]
pub(crate) struct FakeDrive {
    listings: HashMap<String, Vec<FileRecord>>,
    files: HashMap<String, FileRecord>,
    failing_queries: HashSet<String>,
    page_cap: Option<usize>,
    user: Option<UserRecord>,
    drives: Option<Vec<DriveRecord>>,
    comments: Option<Vec<CommentRecord>>,
    content: HashMap<String, Vec<u8>>,
    pub(crate) requests: Mutex<Vec<ListRequest>>,
    pub(crate) updates: Mutex<Vec<(String, JsonValue)>>,
    pub(crate) replies: Mutex<Vec<(String, String, String)>>,
}

pub(crate) fn record(id: &str, mime_type: &str) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        name: Some(format!("{id}-name")),
        mime_type: Some(mime_type.to_string()),
        ..FileRecord::default()
    }
}

pub(crate) fn folder(id: &str) -> FileRecord {
    record(id, FOLDER_MIME_TYPE)
}

pub(crate) fn file(id: &str) -> FileRecord {
    record(id, "text/plain")
}

impl FakeDrive {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serves `records` for exactly `query`.
    pub(crate) fn with_listing(
        mut self,
        query: impl Into<String>,
        records: Vec<FileRecord>,
    ) -> Self {
        self.listings.insert(query.into(), records);
        self
    }

    /// Serves `children` as the direct children of `folder_id`.
    pub(crate) fn with_children(self, folder_id: &str, children: Vec<FileRecord>) -> Self {
        self.with_listing(children_filter(folder_id), children)
    }

    /// Makes listing `folder_id`'s children fail with a permission error.
    pub(crate) fn with_unlistable_folder(self, folder_id: &str) -> Self {
        self.with_failing_query(children_filter(folder_id))
    }

    pub(crate) fn with_failing_query(mut self, query: impl Into<String>) -> Self {
        self.failing_queries.insert(query.into());
        self
    }

    pub(crate) fn with_page_cap(mut self, cap: usize) -> Self {
        self.page_cap = Some(cap);
        self
    }

    pub(crate) fn with_file(mut self, record: FileRecord) -> Self {
        self.files.insert(record.id.clone(), record);
        self
    }

    pub(crate) fn with_content(mut self, file_id: &str, bytes: &[u8]) -> Self {
        self.content.insert(file_id.to_string(), bytes.to_vec());
        self
    }

    pub(crate) fn with_user(mut self, user: UserRecord) -> Self {
        self.user = Some(user);
        self
    }

    pub(crate) fn with_drives(mut self, drives: Vec<DriveRecord>) -> Self {
        self.drives = Some(drives);
        self
    }

    pub(crate) fn with_comments(mut self, comments: Vec<CommentRecord>) -> Self {
        self.comments = Some(comments);
        self
    }

    pub(crate) fn recorded_requests(&self) -> Vec<ListRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn recorded_queries(&self) -> Vec<String> {
        self.recorded_requests()
            .into_iter()
            .map(|request| request.query)
            .collect()
    }
}

fn parse_offset(token: Option<&str>) -> usize {
    token.map_or(0, |t| t.parse().unwrap())
}

#[async_trait]
impl DriveApi for FakeDrive {
    async fn list_files(&self, request: &ListRequest) -> Result<FilePage> {
        self.requests.lock().unwrap().push(request.clone());

        if self.failing_queries.contains(&request.query) {
            return Err(DriveError::Api {
                status: 403,
                message: "insufficient permissions".to_string(),
            });
        }

        let records = self
            .listings
            .get(&request.query)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let offset = parse_offset(request.page_token.as_deref());
        let mut take = usize::try_from(request.page_size).unwrap();
        if let Some(cap) = self.page_cap {
            take = take.min(cap);
        }
        let end = (offset + take).min(records.len());

        Ok(FilePage {
            files: records[offset..end].to_vec(),
            next_page_token: (end < records.len()).then(|| end.to_string()),
        })
    }

    async fn get_file(&self, file_id: &str) -> Result<FileRecord> {
        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| DriveError::NotFound(file_id.to_string()))
    }

    async fn about(&self) -> Result<UserRecord> {
        self.user
            .clone()
            .ok_or_else(|| DriveError::Transient("about unavailable".to_string()))
    }

    async fn list_drives(&self, page_token: Option<&str>) -> Result<DrivePage> {
        let drives = self
            .drives
            .as_ref()
            .ok_or_else(|| DriveError::Api {
                status: 403,
                message: "shared drives disabled".to_string(),
            })?;
        // One drive per page to exercise pagination.
        let offset = parse_offset(page_token);
        Ok(DrivePage {
            drives: drives.iter().skip(offset).take(1).cloned().collect(),
            next_page_token: (offset + 1 < drives.len()).then(|| (offset + 1).to_string()),
        })
    }

    async fn update_file(&self, file_id: &str, body: &JsonValue) -> Result<FileRecord> {
        if !self.files.contains_key(file_id) {
            return Err(DriveError::NotFound(file_id.to_string()));
        }
        self.updates
            .lock()
            .unwrap()
            .push((file_id.to_string(), body.clone()));
        Ok(FileRecord {
            id: file_id.to_string(),
            ..FileRecord::default()
        })
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        self.content
            .get(file_id)
            .cloned()
            .ok_or_else(|| DriveError::NotFound(file_id.to_string()))
    }

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>> {
        self.content
            .get(file_id)
            .map(|bytes| [mime_type.as_bytes(), b":", bytes].concat())
            .ok_or_else(|| DriveError::NotFound(file_id.to_string()))
    }

    async fn list_comments(&self, file_id: &str, page_token: Option<&str>) -> Result<CommentPage> {
        let comments = self
            .comments
            .as_ref()
            .ok_or_else(|| DriveError::NotFound(file_id.to_string()))?;
        let offset = parse_offset(page_token);
        Ok(CommentPage {
            comments: comments.iter().skip(offset).take(1).cloned().collect(),
            next_page_token: (offset + 1 < comments.len()).then(|| (offset + 1).to_string()),
        })
    }

    async fn create_reply(&self, file_id: &str, comment_id: &str, content: &str) -> Result<String> {
        let mut replies = self.replies.lock().unwrap();
        replies.push((
            file_id.to_string(),
            comment_id.to_string(),
            content.to_string(),
        ));
        Ok(format!("reply-{}", replies.len()))
    }

    async fn list_labels(&self, file_id: &str) -> Result<Vec<JsonValue>> {
        self.files
            .get(file_id)
            .map(|_| vec![serde_json::json!({ "id": "label-1" })])
            .ok_or_else(|| DriveError::NotFound(file_id.to_string()))
    }
}
