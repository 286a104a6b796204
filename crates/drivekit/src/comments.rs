//! Comment threads, flattened for display.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    DriveError, Result,
    api::{AuthorRecord, CommentRecord, ReplyRecord},
};

const UNKNOWN_AUTHOR: &str = "Unknown";
const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A top-level comment with its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub author_email: String,
    pub content: String,
    /// The document text the comment is anchored to.
    pub snippet: String,
    pub created_time: String,
    pub modified_time: String,
    pub resolved: bool,
    pub anchor: String,
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub id: String,
    pub author: String,
    pub author_email: String,
    pub content: String,
    pub created_time: String,
    pub modified_time: String,
}

impl Comment {
    /// Flattens a remote comment. Times are rendered as UTC `YYYY-MM-DD HH:MM`.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::Decode`] if a timestamp is not RFC 3339.
    pub fn from_record(record: CommentRecord) -> Result<Self> {
        let (author, author_email) = author_fields(record.author);
        let replies = record
            .replies
            .into_iter()
            .map(Reply::from_record)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: record.id,
            author,
            author_email,
            content: record.content.unwrap_or_default(),
            snippet: record
                .quoted_file_content
                .and_then(|quoted| quoted.value)
                .unwrap_or_default(),
            created_time: display_time(&record.created_time)?,
            modified_time: display_time(&record.modified_time)?,
            resolved: record.resolved.unwrap_or(false),
            anchor: record.anchor.unwrap_or_default(),
            replies,
        })
    }
}

impl Reply {
    /// # Errors
    ///
    /// Returns [`DriveError::Decode`] if a timestamp is not RFC 3339.
    pub fn from_record(record: ReplyRecord) -> Result<Self> {
        let (author, author_email) = author_fields(record.author);
        Ok(Self {
            id: record.id,
            author,
            author_email,
            content: record.content.unwrap_or_default(),
            created_time: display_time(&record.created_time)?,
            modified_time: display_time(&record.modified_time)?,
        })
    }
}

fn author_fields(author: Option<AuthorRecord>) -> (String, String) {
    let author = author.unwrap_or_default();
    (
        author
            .display_name
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        author.email_address.unwrap_or_default(),
    )
}

fn display_time(raw: &str) -> Result<String> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| DriveError::Decode(format!("invalid comment timestamp '{raw}': {e}")))?;
    Ok(parsed
        .with_timezone(&Utc)
        .format(DISPLAY_TIME_FORMAT)
        .to_string())
}
