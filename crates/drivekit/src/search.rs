//! Name and full-text search, optionally scoped to a folder subtree.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::{
    Result,
    api::DriveApi,
    closure::resolve_folder_closure,
    listing::{Partial, list_paginated},
    model::DriveItem,
    query::{MatchMode, build_filter},
};

/// Result count used when the caller does not pick one.
pub const DEFAULT_SEARCH_LIMIT: usize = 25;

/// Parameters of one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub text: String,
    pub mode: MatchMode,
    pub limit: usize,
    /// Restrict results to this folder and every folder below it.
    pub folder_id: Option<String>,
}

impl SearchRequest {
    pub fn new(text: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            text: text.into(),
            mode,
            limit: DEFAULT_SEARCH_LIMIT,
            folder_id: None,
        }
    }

    pub fn by_name(text: impl Into<String>) -> Self {
        Self::new(text, MatchMode::Name)
    }

    pub fn by_content(text: impl Into<String>) -> Self {
        Self::new(text, MatchMode::FullText)
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn in_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }
}

/// Runs a search.
///
/// When the request is folder-scoped, the folder subtree is resolved first
/// and the filter restricted to it. Subfolders that cannot be listed are
/// simply left out of the scope; if the scope folder itself cannot be listed
/// the search runs unscoped. Zero matches is a successful, empty result.
///
/// # Errors
///
/// Fails only when the search listing itself fails, or when the scope folder
/// id is blank.
#[instrument(
    skip(api, request, cancel),
    fields(text = %request.text, mode = ?request.mode, limit = request.limit)
)]
pub async fn search<A>(
    api: &A,
    request: &SearchRequest,
    cancel: Option<&CancellationToken>,
) -> Result<Partial<Vec<DriveItem>>>
where
    A: DriveApi + ?Sized,
{
    let scope = match request.folder_id.as_deref() {
        Some(folder_id) => {
            info!(folder_id = %folder_id, "Collecting folder ids for scoped search");
            let resolved = resolve_folder_closure(api, folder_id, cancel).await?;
            if !resolved.complete {
                return Ok(Partial::interrupted(Vec::new()));
            }
            let mut closure = resolved.into_inner();
            if let Some(error) = closure.take_root_failure() {
                warn!(error = %error, "Searching without folder scope");
                None
            } else {
                info!(folders = closure.len(), "Found folders to search in");
                Some(closure.into_folder_ids())
            }
        }
        None => None,
    };

    let filter = build_filter(&request.text, request.mode, scope.as_deref());
    let result = list_paginated(api, &filter, Some(request.limit), cancel).await?;
    info!(results = result.value.len(), "Search finished");
    Ok(result)
}
