//! Paginated listing engine.
//!
//! One logical list or search is issued as a sequence of `files.list` page
//! requests. Page sizes shrink as the caller's limit approaches so the
//! service never hands back more than is needed, and no request is issued
//! once the limit is met.

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    Result,
    api::{DriveApi, ListRequest},
    model::DriveItem,
    query::children_filter,
};

/// Hard page-size ceiling imposed by the service.
pub const MAX_PAGE_SIZE: usize = 1000;

/// A result that may have been cut short by cancellation.
///
/// `complete` is `false` when the operation stopped early; `value` then holds
/// whatever was accumulated before the stop.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial<T> {
    pub value: T,
    pub complete: bool,
}

impl<T> Partial<T> {
    pub fn complete(value: T) -> Self {
        Self {
            value,
            complete: true,
        }
    }

    pub fn interrupted(value: T) -> Self {
        Self {
            value,
            complete: false,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Partial<U> {
        Partial {
            value: f(self.value),
            complete: self.complete,
        }
    }
}

/// Lists every item matching `filter`, up to `limit` items.
///
/// `limit = None` pages until the service reports no continuation token.
/// Items come back in the service's order.
///
/// # Errors
///
/// Returns the first error raised by a page request.
#[instrument(skip(api, cancel))]
pub async fn list_paginated<A>(
    api: &A,
    filter: &str,
    limit: Option<usize>,
    cancel: Option<&CancellationToken>,
) -> Result<Partial<Vec<DriveItem>>>
where
    A: DriveApi + ?Sized,
{
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0_usize;

    loop {
        let remaining = match limit {
            Some(limit) => limit.saturating_sub(items.len()),
            None => MAX_PAGE_SIZE,
        };
        if remaining == 0 {
            break;
        }
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            debug!(collected = items.len(), pages, "Listing cancelled");
            return Ok(Partial::interrupted(items));
        }

        let request = ListRequest {
            query: filter.to_string(),
            page_size: page_size_for(remaining),
            page_token: page_token.take(),
            all_drives: true,
        };
        let page = api.list_files(&request).await?;
        pages += 1;

        let wanted = limit.map_or(usize::MAX, |limit| limit - items.len());
        items.extend(
            page.files
                .into_iter()
                .take(wanted)
                .map(DriveItem::from_remote_record),
        );

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    debug!(collected = items.len(), pages, "Listing finished");
    Ok(Partial::complete(items))
}

/// Lists the non-trashed direct children of `folder_id`.
///
/// # Errors
///
/// Returns the first error raised by a page request.
pub async fn list_children<A>(
    api: &A,
    folder_id: &str,
    limit: Option<usize>,
    cancel: Option<&CancellationToken>,
) -> Result<Partial<Vec<DriveItem>>>
where
    A: DriveApi + ?Sized,
{
    list_paginated(api, &children_filter(folder_id), limit, cancel).await
}

fn page_size_for(remaining: usize) -> u32 {
    u32::try_from(remaining.min(MAX_PAGE_SIZE)).unwrap_or(u32::MAX)
}
