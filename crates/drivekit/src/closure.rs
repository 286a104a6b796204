//! Folder closure resolution.
//!
//! Collects every folder reachable from a root folder. The service does not
//! prevent cycles in the parent/child graph (shared-drive shortcuts, stale
//! parents), so traversal keeps a visited set for the whole resolution and
//! never lists a folder twice.

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    DriveError, Result,
    api::DriveApi,
    listing::{Partial, list_children},
};

/// A folder whose children could not be listed.
#[derive(Debug)]
pub struct FolderFailure {
    pub folder_id: String,
    pub error: DriveError,
}

/// Every folder reachable from a root, root included.
#[derive(Debug, Default)]
pub struct FolderClosure {
    root_id: String,
    folders: Vec<String>,
    failures: Vec<FolderFailure>,
}

impl FolderClosure {
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Folder ids in discovery order, each exactly once.
    pub fn folder_ids(&self) -> &[String] {
        &self.folders
    }

    pub fn contains(&self, folder_id: &str) -> bool {
        self.folders.iter().any(|id| id == folder_id)
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Folders that were reached but could not be listed.
    pub fn failures(&self) -> &[FolderFailure] {
        &self.failures
    }

    /// Whether the root folder itself could not be listed.
    pub fn root_unresolvable(&self) -> bool {
        self.failures.iter().any(|f| f.folder_id == self.root_id)
    }

    /// Takes the failure recorded for the root, as a scope error.
    pub fn take_root_failure(&mut self) -> Option<DriveError> {
        let index = self
            .failures
            .iter()
            .position(|f| f.folder_id == self.root_id)?;
        let failure = self.failures.remove(index);
        Some(DriveError::ScopeUnresolvable {
            folder_id: failure.folder_id,
            source: Box::new(failure.error),
        })
    }

    pub fn into_folder_ids(self) -> Vec<String> {
        self.folders
    }
}

/// Resolves the transitive set of folders under `root_id`.
///
/// A folder whose listing fails is kept in the result, contributes no
/// children, and is reported in [`FolderClosure::failures`]. The root is
/// always part of the result, even if it cannot be listed.
///
/// # Errors
///
/// Returns [`DriveError::MalformedInput`] if `root_id` is blank. Listing
/// failures never abort the traversal.
#[instrument(skip(api, cancel))]
pub async fn resolve_folder_closure<A>(
    api: &A,
    root_id: &str,
    cancel: Option<&CancellationToken>,
) -> Result<Partial<FolderClosure>>
where
    A: DriveApi + ?Sized,
{
    if root_id.trim().is_empty() {
        return Err(DriveError::MalformedInput(
            "root folder id must not be empty".to_string(),
        ));
    }

    let mut closure = FolderClosure {
        root_id: root_id.to_string(),
        ..FolderClosure::default()
    };
    let mut visited: HashSet<String> = HashSet::new();
    let mut pending = vec![root_id.to_string()];

    while let Some(folder_id) = pending.pop() {
        if !visited.insert(folder_id.clone()) {
            debug!(folder_id = %folder_id, "Skipping already visited folder");
            continue;
        }
        closure.folders.push(folder_id.clone());

        if cancel.is_some_and(CancellationToken::is_cancelled) {
            info!(found = closure.folders.len(), "Folder resolution cancelled");
            return Ok(Partial::interrupted(closure));
        }

        match list_children(api, &folder_id, None, cancel).await {
            Ok(children) => {
                let complete = children.complete;
                // Reverse so the stack pops siblings in listing order.
                pending.extend(
                    children
                        .value
                        .into_iter()
                        .rev()
                        .filter(|child| child.is_directory())
                        .map(|child| child.id().to_string()),
                );
                if !complete {
                    info!(found = closure.folders.len(), "Folder resolution cancelled");
                    return Ok(Partial::interrupted(closure));
                }
            }
            Err(error) => {
                warn!(folder_id = %folder_id, error = %error, "Failed to list folder");
                closure.failures.push(FolderFailure { folder_id, error });
            }
        }
    }

    info!(
        root_id = %root_id,
        folders = closure.folders.len(),
        failures = closure.failures.len(),
        "Resolved folder closure"
    );
    Ok(Partial::complete(closure))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDrive, file, folder};

    async fn resolve(api: &FakeDrive, root: &str) -> FolderClosure {
        let result = resolve_folder_closure(api, root, None).await.unwrap();
        assert!(result.complete);
        result.value
    }

    #[tokio::test]
    async fn test_direct_cycle_terminates_with_both_folders() {
        let api = FakeDrive::new()
            .with_children("F1", vec![folder("F2")])
            .with_children("F2", vec![folder("F1")]);

        let closure = resolve(&api, "F1").await;

        assert_eq!(closure.folder_ids(), ["F1", "F2"]);
        assert_eq!(api.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_deep_cycle_visits_each_folder_once() {
        let api = FakeDrive::new()
            .with_children("A", vec![folder("B"), folder("C")])
            .with_children("B", vec![folder("D")])
            .with_children("C", vec![folder("D"), folder("A")])
            .with_children("D", vec![folder("B"), folder("A")]);

        let closure = resolve(&api, "A").await;

        let mut ids = closure.folder_ids().to_vec();
        ids.sort();
        assert_eq!(ids, ["A", "B", "C", "D"]);
        // Each folder is listed exactly once.
        let mut queries = api.recorded_queries();
        queries.sort();
        queries.dedup();
        assert_eq!(queries.len(), 4);
        assert_eq!(api.recorded_requests().len(), 4);
    }

    #[tokio::test]
    async fn test_self_parented_folder_terminates() {
        let api = FakeDrive::new().with_children("A", vec![folder("A")]);

        let closure = resolve(&api, "A").await;

        assert_eq!(closure.folder_ids(), ["A"]);
    }

    #[tokio::test]
    async fn test_only_directories_are_descended() {
        let api = FakeDrive::new().with_children(
            "root-folder",
            vec![file("notes.txt"), folder("sub"), file("data.csv")],
        );

        let closure = resolve(&api, "root-folder").await;

        assert_eq!(closure.folder_ids(), ["root-folder", "sub"]);
        assert_eq!(
            api.recorded_queries(),
            [
                "'root-folder' in parents and trashed=false",
                "'sub' in parents and trashed=false"
            ]
        );
    }

    #[tokio::test]
    async fn test_siblings_are_visited_in_listing_order() {
        let api = FakeDrive::new().with_children("R", vec![folder("S1"), folder("S2")]);

        let closure = resolve(&api, "R").await;

        assert_eq!(closure.folder_ids(), ["R", "S1", "S2"]);
    }

    #[tokio::test]
    async fn test_unlistable_subfolder_is_kept_and_traversal_continues() {
        let api = FakeDrive::new()
            .with_children("R", vec![folder("locked"), folder("open")])
            .with_unlistable_folder("locked")
            .with_children("open", vec![folder("deep")]);

        let closure = resolve(&api, "R").await;

        assert!(closure.contains("locked"));
        assert!(closure.contains("deep"));
        assert_eq!(closure.len(), 4);
        assert_eq!(closure.failures().len(), 1);
        assert_eq!(closure.failures()[0].folder_id, "locked");
        assert!(!closure.root_unresolvable());
    }

    #[tokio::test]
    async fn test_unlistable_root_still_yields_root() {
        let api = FakeDrive::new().with_unlistable_folder("FX");

        let mut closure = resolve(&api, "FX").await;

        assert_eq!(closure.folder_ids(), ["FX"]);
        assert!(closure.root_unresolvable());
        let error = closure.take_root_failure().unwrap();
        assert!(matches!(
            error,
            DriveError::ScopeUnresolvable { ref folder_id, .. } if folder_id == "FX"
        ));
        assert!(closure.failures().is_empty());
    }

    #[tokio::test]
    async fn test_blank_root_is_malformed_input() {
        let api = FakeDrive::new();

        let result = resolve_folder_closure(&api, "  ", None).await;

        assert!(matches!(result, Err(DriveError::MalformedInput(_))));
        assert!(api.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_resolution_returns_partial_closure() {
        let api = FakeDrive::new().with_children("R", vec![folder("S")]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = resolve_folder_closure(&api, "R", Some(&cancel)).await.unwrap();

        assert!(!result.complete);
        assert_eq!(result.value.folder_ids(), ["R"]);
        assert!(api.recorded_requests().is_empty());
    }
}
