//! High-level client for one authenticated user.

use std::{collections::BTreeMap, path::Path};

use serde_json::{Map, Value as JsonValue};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::{
    DriveError, Result,
    api::{DriveApi, UserRecord},
    closure::{FolderClosure, resolve_folder_closure},
    comments::Comment,
    config::DriveConfig,
    http::HttpDriveApi,
    listing::{Partial, list_children},
    model::{Drive, DriveItem, ItemKind, PropertyScope, UserInfo},
    query::MatchMode,
    search::{DEFAULT_SEARCH_LIMIT, SearchRequest, search},
};

/// Entry point for every drive operation on behalf of one user.
///
/// Construction fetches the user's identity and the list of drives; both are
/// cached for the lifetime of the client. Everything else goes to the service
/// on every call.
#[derive(Debug)]
pub struct DriveClient<A: DriveApi = HttpDriveApi> {
    api: A,
    user: UserInfo,
    drives: Vec<Drive>,
    default_limit: usize,
}

impl DriveClient<HttpDriveApi> {
    /// Connects to the service described by `config`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration has no access token or if the current user
    /// cannot be fetched.
    pub async fn from_config(config: &DriveConfig) -> Result<Self> {
        let api = HttpDriveApi::from_config(config)?;
        Ok(Self::connect(api)
            .await?
            .with_default_limit(config.search.default_limit))
    }
}

impl<A: DriveApi> DriveClient<A> {
    /// Wraps `api`, fetching the current user and the drive list.
    ///
    /// # Errors
    ///
    /// Returns the error of the user lookup. A failure listing shared drives
    /// is not an error.
    #[instrument(skip(api))]
    pub async fn connect(api: A) -> Result<Self> {
        let user = user_info_from(api.about().await?)?;
        info!(user = %user.email, "Connected to drive");
        let mut client = Self {
            api,
            user,
            drives: Vec::new(),
            default_limit: DEFAULT_SEARCH_LIMIT,
        };
        client.refresh_drives().await;
        Ok(client)
    }

    /// Sets the limit used by searches that do not specify one.
    #[must_use]
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn user_info(&self) -> &UserInfo {
        &self.user
    }

    /// My Drive first, then every shared drive, as of the last refresh.
    pub fn drives(&self) -> &[Drive] {
        &self.drives
    }

    /// Re-reads the drive list from the service.
    pub async fn refresh_drives(&mut self) -> &[Drive] {
        let mut drives = vec![Drive::my_drive()];
        let mut page_token: Option<String> = None;
        loop {
            match self.api.list_drives(page_token.as_deref()).await {
                Ok(page) => {
                    drives.extend(page.drives.into_iter().map(|d| Drive {
                        id: d.id,
                        name: d.name,
                    }));
                    match page.next_page_token {
                        Some(token) if !token.is_empty() => page_token = Some(token),
                        _ => break,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to list shared drives");
                    break;
                }
            }
        }
        self.drives = drives;
        &self.drives
    }

    /// Fetches a fully populated item.
    ///
    /// # Errors
    ///
    /// `NotFound` if the item is absent or not visible, `Transient` on
    /// network failures.
    pub async fn get_item(&self, item_id: &str) -> Result<DriveItem> {
        require_id("item id", item_id)?;
        let record = self.api.get_file(item_id).await?;
        Ok(DriveItem::from_remote_record(record))
    }

    /// Lists the direct children of a folder.
    ///
    /// # Errors
    ///
    /// Returns the first failing page request.
    pub async fn list_items(
        &self,
        parent_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<DriveItem>> {
        self.list_items_cancellable(parent_id, limit, None)
            .await
            .map(Partial::into_inner)
    }

    /// [`DriveClient::list_items`] that stops between pages once `cancel`
    /// fires.
    ///
    /// # Errors
    ///
    /// Returns the first failing page request.
    pub async fn list_items_cancellable(
        &self,
        parent_id: &str,
        limit: Option<usize>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Partial<Vec<DriveItem>>> {
        require_id("parent id", parent_id)?;
        list_children(&self.api, parent_id, limit, cancel).await
    }

    /// Every folder reachable from `root_id`, root included.
    ///
    /// # Errors
    ///
    /// Only for a blank root id.
    pub async fn resolve_folder_closure(
        &self,
        root_id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Partial<FolderClosure>> {
        resolve_folder_closure(&self.api, root_id, cancel).await
    }

    /// Searches item names.
    ///
    /// `limit` defaults to the client's default limit. With `folder_id`, only
    /// items inside that folder's subtree are returned.
    ///
    /// # Errors
    ///
    /// Only when the search listing itself fails.
    pub async fn search_by_name(
        &self,
        text: &str,
        limit: Option<usize>,
        folder_id: Option<&str>,
    ) -> Result<Vec<DriveItem>> {
        let request = self.search_request(text, MatchMode::Name, limit, folder_id);
        self.search(&request, None).await.map(Partial::into_inner)
    }

    /// Searches item content. Same contract as [`DriveClient::search_by_name`].
    ///
    /// # Errors
    ///
    /// Only when the search listing itself fails.
    pub async fn search_by_content(
        &self,
        text: &str,
        limit: Option<usize>,
        folder_id: Option<&str>,
    ) -> Result<Vec<DriveItem>> {
        let request = self.search_request(text, MatchMode::FullText, limit, folder_id);
        self.search(&request, None).await.map(Partial::into_inner)
    }

    /// Runs an explicit search request, optionally cancellable.
    ///
    /// # Errors
    ///
    /// Only when the search listing itself fails.
    pub async fn search(
        &self,
        request: &SearchRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<Partial<Vec<DriveItem>>> {
        search(&self.api, request, cancel).await
    }

    /// Builds a search request with this client's default limit.
    pub fn search_request(
        &self,
        text: &str,
        mode: MatchMode,
        limit: Option<usize>,
        folder_id: Option<&str>,
    ) -> SearchRequest {
        let mut request =
            SearchRequest::new(text, mode).with_limit(limit.unwrap_or(self.default_limit));
        if let Some(folder_id) = folder_id {
            request = request.in_folder(folder_id);
        }
        request
    }

    /// Sets or deletes properties on an item and returns the refreshed item.
    ///
    /// `Some(value)` sets a key, `None` deletes it. All changes go out in a
    /// single update.
    ///
    /// # Errors
    ///
    /// `MalformedInput` for an empty change set, otherwise the update's error.
    #[instrument(skip(self, changes), fields(keys = changes.len()))]
    pub async fn update_properties(
        &self,
        item_id: &str,
        changes: &BTreeMap<String, Option<String>>,
        scope: PropertyScope,
    ) -> Result<DriveItem> {
        require_id("item id", item_id)?;
        if changes.is_empty() {
            return Err(DriveError::MalformedInput(
                "no property changes given".to_string(),
            ));
        }

        let map: Map<String, JsonValue> = changes
            .iter()
            .map(|(key, value)| {
                let value = value.clone().map_or(JsonValue::Null, JsonValue::String);
                (key.clone(), value)
            })
            .collect();
        let mut body = Map::new();
        body.insert(scope.field_name().to_string(), JsonValue::Object(map));

        self.api
            .update_file(item_id, &JsonValue::Object(body))
            .await?;
        self.get_item(item_id).await
    }

    /// Downloads the raw bytes of a binary file.
    ///
    /// # Errors
    ///
    /// `MalformedInput` for folders and structured documents, which have no
    /// raw content; otherwise the download's error.
    pub async fn download_file(&self, item: &DriveItem) -> Result<Vec<u8>> {
        match item.kind() {
            Some(ItemKind::Directory) => {
                return Err(DriveError::MalformedInput(format!(
                    "cannot download directory '{}'",
                    item.name().unwrap_or(item.id())
                )));
            }
            Some(kind) if kind.is_structured_document() => {
                return Err(DriveError::MalformedInput(format!(
                    "cannot download {kind} '{}', export it instead",
                    item.id()
                )));
            }
            _ => {}
        }
        self.api.download(item.id()).await
    }

    /// Downloads a binary file and writes it to `path`.
    ///
    /// # Errors
    ///
    /// Same as [`DriveClient::download_file`], plus `Io` if the file cannot
    /// be written.
    pub async fn download_file_to(&self, item: &DriveItem, path: &Path) -> Result<()> {
        let bytes = self.download_file(item).await?;
        tokio::fs::write(path, &bytes).await?;
        info!(item_id = %item.id(), path = %path.display(), bytes = bytes.len(), "Saved file");
        Ok(())
    }

    /// Exports a structured document to `mime_type`.
    ///
    /// # Errors
    ///
    /// `MalformedInput` for anything but a structured document.
    pub async fn export_document(&self, item: &DriveItem, mime_type: &str) -> Result<Vec<u8>> {
        if !item.kind().is_some_and(ItemKind::is_structured_document) {
            return Err(DriveError::MalformedInput(format!(
                "'{}' is not a structured document",
                item.id()
            )));
        }
        if mime_type.trim().is_empty() {
            return Err(DriveError::MalformedInput(
                "export mime type must not be empty".to_string(),
            ));
        }
        self.api.export(item.id(), mime_type).await
    }

    /// Every non-deleted comment on a file, with replies.
    ///
    /// Files that do not support comments are common, so any failure is
    /// logged and yields an empty list.
    pub async fn get_comments(&self, file_id: &str) -> Vec<Comment> {
        match self.fetch_comments(file_id).await {
            Ok(comments) => {
                info!(file_id = %file_id, count = comments.len(), "Retrieved comments");
                comments
            }
            Err(e) => {
                error!(file_id = %file_id, error = %e, "Failed to get comments");
                Vec::new()
            }
        }
    }

    async fn fetch_comments(&self, file_id: &str) -> Result<Vec<Comment>> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .api
                .list_comments(file_id, page_token.as_deref())
                .await?;
            records.extend(page.comments);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        records.into_iter().map(Comment::from_record).collect()
    }

    /// Replies to a comment and returns the new reply's id.
    ///
    /// # Errors
    ///
    /// `MalformedInput` for empty content, otherwise the service's error.
    pub async fn reply_to_comment(
        &self,
        file_id: &str,
        comment_id: &str,
        content: &str,
    ) -> Result<String> {
        require_id("file id", file_id)?;
        require_id("comment id", comment_id)?;
        if content.trim().is_empty() {
            return Err(DriveError::MalformedInput(
                "reply content must not be empty".to_string(),
            ));
        }
        self.api.create_reply(file_id, comment_id, content).await
    }

    /// Whether the current user can see the item. Any failure means no.
    pub async fn check_item_access(&self, item_id: &str) -> bool {
        if item_id.trim().is_empty() {
            return false;
        }
        self.api.get_file(item_id).await.is_ok()
    }

    /// Labels applied to an item, as returned by the service.
    ///
    /// # Errors
    ///
    /// Returns the service's error.
    pub async fn get_labels(&self, item_id: &str) -> Result<Vec<JsonValue>> {
        require_id("item id", item_id)?;
        self.api.list_labels(item_id).await
    }
}

fn user_info_from(record: UserRecord) -> Result<UserInfo> {
    match (record.permission_id, record.display_name, record.email_address) {
        (Some(id), Some(name), Some(email)) => Ok(UserInfo { id, name, email }),
        _ => Err(DriveError::Decode(
            "user information is incomplete".to_string(),
        )),
    }
}

fn require_id(what: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(DriveError::MalformedInput(format!("{what} must not be empty")));
    }
    Ok(())
}
