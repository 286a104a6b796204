//! Item model: files, folders, and structured documents.
//!
//! A [`DriveItem`] can be filled two ways, and they are deliberately
//! different:
//!
//! - [`DriveItem::from_remote_record`] / [`DriveItem::refresh_from_remote`]
//!   treat the remote record as authoritative. A field missing from the record
//!   clears the previously known value.
//! - [`DriveItem::populate`] / [`DriveItem::with_updates`] merge an
//!   [`ItemUpdate`] field by field. A `None` field leaves the current value in
//!   place.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{DriveError, Result, api::FileRecord};

/// Sentinel id of the user's personal storage root.
pub const MY_DRIVE_ID: &str = "root";

const MY_DRIVE_NAME: &str = "My Drive";

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";
pub const SLIDES_MIME_TYPE: &str = "application/vnd.google-apps.presentation";
pub const SHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Closed set of item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    #[serde(rename = "directory")]
    Directory,
    #[serde(rename = "raw_file")]
    RawFile,
    #[serde(rename = "docs_document")]
    Document,
    #[serde(rename = "docs_slides")]
    Slides,
    #[serde(rename = "docs_sheets")]
    Sheet,
}

impl ItemKind {
    /// Maps the service's MIME type to a kind. Unknown types are raw files.
    pub fn from_mime_type(mime_type: &str) -> Self {
        match mime_type {
            FOLDER_MIME_TYPE => ItemKind::Directory,
            DOCUMENT_MIME_TYPE => ItemKind::Document,
            SLIDES_MIME_TYPE => ItemKind::Slides,
            SHEET_MIME_TYPE => ItemKind::Sheet,
            _ => ItemKind::RawFile,
        }
    }

    /// Structured documents have no raw content and must be exported.
    pub fn is_structured_document(self) -> bool {
        matches!(self, ItemKind::Document | ItemKind::Slides | ItemKind::Sheet)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Directory => "directory",
            ItemKind::RawFile => "raw_file",
            ItemKind::Document => "docs_document",
            ItemKind::Slides => "docs_slides",
            ItemKind::Sheet => "docs_sheets",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the current user may do with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub can_edit: bool,
    pub can_comment: bool,
    pub can_view: bool,
}

/// Which of the two property maps an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyScope {
    /// `properties`: visible to every application.
    Global,
    /// `appProperties`: visible only to this integration.
    App,
}

impl PropertyScope {
    /// Field name of this map in the service's file resource.
    pub fn field_name(self) -> &'static str {
        match self {
            PropertyScope::Global => "properties",
            PropertyScope::App => "appProperties",
        }
    }
}

/// One node in the storage hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriveItem {
    id: String,
    name: Option<String>,
    created_time: Option<DateTime<Utc>>,
    modified_time: Option<DateTime<Utc>>,
    owner: Option<String>,
    #[serde(rename = "type")]
    kind: Option<ItemKind>,
    properties: BTreeMap<String, String>,
    app_properties: BTreeMap<String, String>,
    permissions: Vec<Permission>,
    children_ids: Vec<String>,
    export_links: Option<BTreeMap<String, String>>,
}

/// Partial set of fields for [`DriveItem::populate`].
///
/// `None` means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
    pub owner: Option<String>,
    pub kind: Option<ItemKind>,
    pub properties: Option<BTreeMap<String, String>>,
    pub app_properties: Option<BTreeMap<String, String>>,
    pub permissions: Option<Vec<Permission>>,
    pub children_ids: Option<Vec<String>>,
    pub export_links: Option<BTreeMap<String, String>>,
}

impl DriveItem {
    /// Creates a stub that only knows its id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            created_time: None,
            modified_time: None,
            owner: None,
            kind: None,
            properties: BTreeMap::new(),
            app_properties: BTreeMap::new(),
            permissions: Vec::new(),
            children_ids: Vec::new(),
            export_links: None,
        }
    }

    /// Builds a fully populated item from a remote record.
    pub fn from_remote_record(record: FileRecord) -> Self {
        let mut item = Self::new(record.id.clone());
        item.refresh_from_remote(record);
        item
    }

    /// Replaces every mapped field with the record's value.
    ///
    /// The id is never touched. Children are not part of the remote record,
    /// so they are kept only while the refreshed kind is still a directory.
    pub fn refresh_from_remote(&mut self, record: FileRecord) {
        let capabilities = record.capabilities.unwrap_or_default();
        let kind = ItemKind::from_mime_type(record.mime_type.as_deref().unwrap_or_default());

        self.name = record.name;
        self.created_time = record.created_time.as_deref().and_then(parse_timestamp);
        self.modified_time = record.modified_time.as_deref().and_then(parse_timestamp);
        self.owner = record
            .owners
            .and_then(|owners| owners.into_iter().next())
            .and_then(|owner| owner.email_address);
        self.kind = Some(kind);
        self.properties = record.properties.unwrap_or_default();
        self.app_properties = record.app_properties.unwrap_or_default();
        self.permissions = vec![Permission {
            can_edit: capabilities.can_edit.unwrap_or(false),
            can_comment: capabilities.can_comment.unwrap_or(false),
            can_view: capabilities.can_view.unwrap_or(true),
        }];
        self.export_links = record.export_links;
        if kind != ItemKind::Directory {
            self.children_ids.clear();
        }
    }

    /// Merges `update` into this item.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::MalformedInput`] when the result would hold
    /// children on a non-directory item. Nothing is modified in that case.
    pub fn populate(&mut self, update: ItemUpdate) -> Result<&mut Self> {
        let effective_kind = update.kind.or(self.kind);
        let effective_children = update
            .children_ids
            .as_ref()
            .unwrap_or(&self.children_ids);
        if let Some(kind) = effective_kind
            && kind != ItemKind::Directory
            && (update.children_ids.is_some() || !effective_children.is_empty())
        {
            return Err(DriveError::MalformedInput(format!(
                "children_ids can only be set on directory items, '{}' is {kind}",
                self.id
            )));
        }

        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(created_time) = update.created_time {
            self.created_time = Some(created_time);
        }
        if let Some(modified_time) = update.modified_time {
            self.modified_time = Some(modified_time);
        }
        if let Some(owner) = update.owner {
            self.owner = Some(owner);
        }
        if let Some(kind) = update.kind {
            self.kind = Some(kind);
        }
        if let Some(properties) = update.properties {
            self.properties = properties;
        }
        if let Some(app_properties) = update.app_properties {
            self.app_properties = app_properties;
        }
        if let Some(permissions) = update.permissions {
            self.permissions = permissions;
        }
        if let Some(children_ids) = update.children_ids {
            self.children_ids = children_ids;
        }
        if let Some(export_links) = update.export_links {
            self.export_links = Some(export_links);
        }

        Ok(self)
    }

    /// Owned variant of [`DriveItem::populate`], for builder-style chains.
    ///
    /// # Errors
    ///
    /// Same as [`DriveItem::populate`].
    pub fn with_updates(mut self, update: ItemUpdate) -> Result<Self> {
        self.populate(update)?;
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        self.created_time
    }

    pub fn modified_time(&self) -> Option<DateTime<Utc>> {
        self.modified_time
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn kind(&self) -> Option<ItemKind> {
        self.kind
    }

    pub fn is_directory(&self) -> bool {
        self.kind == Some(ItemKind::Directory)
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn children_ids(&self) -> &[String] {
        &self.children_ids
    }

    pub fn export_links(&self) -> Option<&BTreeMap<String, String>> {
        self.export_links.as_ref()
    }

    /// Returns the global or app-scoped property map.
    pub fn properties(&self, scope: PropertyScope) -> &BTreeMap<String, String> {
        match scope {
            PropertyScope::Global => &self.properties,
            PropertyScope::App => &self.app_properties,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            debug!(timestamp = %raw, error = %e, "Ignoring unparseable timestamp");
            None
        }
    }
}

/// A storage root: the personal drive or a shared drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drive {
    pub id: String,
    pub name: Option<String>,
}

impl Drive {
    /// The personal root, always listed first.
    pub fn my_drive() -> Self {
        Self {
            id: MY_DRIVE_ID.to_string(),
            name: Some(MY_DRIVE_NAME.to_string()),
        }
    }

    pub fn is_my_drive(&self) -> bool {
        self.id == MY_DRIVE_ID
    }
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
}
