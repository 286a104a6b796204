//! Client library for a hierarchical remote file store (the Google Drive v3
//! API).
//!
//! drivekit presents files, folders and structured documents through one
//! item model and builds listing, folder traversal and search on top of a
//! narrow request/response seam, [`DriveApi`].
//!
//! # Key Components
//!
//! - **Item model**: [`DriveItem`], filled either from a remote record
//!   (authoritative) or by merging an [`ItemUpdate`]
//! - **Listing**: [`listing::list_paginated`] hides pagination behind a
//!   result-count limit
//! - **Folder closure**: [`closure::resolve_folder_closure`] walks a folder
//!   subtree safely in the presence of cycles
//! - **Search**: [`search::search`] composes the above into scoped name and
//!   full-text search
//! - **Client**: [`DriveClient`] bundles it all with the user's identity,
//!   drives, comments, properties, labels and downloads
//!
//! # Example
//!
//! ```no_run
//! use drivekit::{DriveClient, DriveConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DriveConfig::load_resolved()?;
//! let client = DriveClient::from_config(&config).await?;
//!
//! for item in client.search_by_name("report", Some(10), None).await? {
//!     println!("{} {}", item.id(), item.name().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Cancellation
//!
//! Listing, traversal and search accept an optional
//! [`tokio_util::sync::CancellationToken`]. The token is checked between
//! remote requests; a cancelled call returns what it had collected as a
//! [`Partial`] with `complete == false`.

mod client;
mod comments;
mod config;
mod error;
mod http;
mod model;

pub mod api;
pub mod closure;
pub mod listing;
pub mod query;
pub mod search;

#[cfg(test)]
mod testing;

pub use api::DriveApi;
pub use client::DriveClient;
pub use comments::{Comment, Reply};
pub use config::{
    ACCESS_TOKEN_ENV, CONFIG_PATH_ENV, ConfigError, DEFAULT_ENDPOINT, DriveConfig, RetryConfig,
    SearchConfig,
};
pub use error::{DriveError, Result};
pub use http::HttpDriveApi;
pub use listing::Partial;
pub use model::{
    DOCUMENT_MIME_TYPE, Drive, DriveItem, FOLDER_MIME_TYPE, ItemKind, ItemUpdate, MY_DRIVE_ID,
    Permission, PropertyScope, SHEET_MIME_TYPE, SLIDES_MIME_TYPE, UserInfo,
};
pub use query::MatchMode;
pub use search::SearchRequest;
