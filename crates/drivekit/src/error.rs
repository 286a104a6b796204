//! Error taxonomy shared by every drivekit operation.

/// Convenience alias used throughout the crate.
pub type Result<T, E = DriveError> = std::result::Result<T, E>;

/// Errors raised by drive operations.
///
/// Leaf calls (a single get or list request) surface these directly. The
/// folder traversal and the search orchestrator downgrade per-folder failures
/// into partial results instead, so a search only fails when its own
/// top-level listing fails.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DriveError {
    /// The requested item is absent or not visible to the current user.
    #[error("item '{0}' not found")]
    NotFound(String),

    /// Network failure, timeout, rate limiting or a server-side error.
    #[error("transient remote failure: {0}")]
    Transient(String),

    /// The caller violated an operation contract.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The folder used to scope a search could not be listed.
    #[error("scope folder '{folder_id}' could not be resolved: {source}")]
    ScopeUnresolvable {
        folder_id: String,
        #[source]
        source: Box<DriveError>,
    },

    /// Any other non-success response from the service.
    #[error("drive API request failed ({status}): {message}")]
    Api { status: u16, message: String },

    /// A response body did not have the expected shape.
    #[error("failed to decode drive response: {0}")]
    Decode(String),

    /// Local I/O error while saving downloaded content.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriveError {
    /// Returns `true` for failures worth retrying at the transport level.
    pub fn is_transient(&self) -> bool {
        matches!(self, DriveError::Transient(_))
    }

    /// Maps an HTTP status and response body to the matching variant.
    pub(crate) fn from_status(status: u16, subject: &str, body: String) -> Self {
        match status {
            404 => DriveError::NotFound(subject.to_string()),
            429 | 500 | 502 | 503 | 504 => {
                DriveError::Transient(format!("HTTP {status}: {body}"))
            }
            _ => DriveError::Api {
                status,
                message: body,
            },
        }
    }
}

impl From<reqwest::Error> for DriveError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DriveError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            DriveError::from_status(status.as_u16(), "", err.to_string())
        } else {
            // Connect, timeout, and body errors are all network-level.
            DriveError::Transient(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_message() {
        let error = DriveError::NotFound("file-1".to_string());
        assert_eq!(error.to_string(), "item 'file-1' not found");
    }

    #[test]
    fn test_from_status_maps_404_to_not_found() {
        let error = DriveError::from_status(404, "file-1", "gone".to_string());
        assert!(matches!(error, DriveError::NotFound(id) if id == "file-1"));
    }

    #[test]
    fn test_from_status_maps_rate_limit_and_server_errors_to_transient() {
        for status in [429, 500, 502, 503, 504] {
            let error = DriveError::from_status(status, "x", String::new());
            assert!(error.is_transient(), "status {status} should be transient");
        }
    }

    #[test]
    fn test_from_status_keeps_other_client_errors_as_api() {
        let error = DriveError::from_status(403, "x", "forbidden".to_string());
        assert!(matches!(
            error,
            DriveError::Api { status: 403, ref message } if message == "forbidden"
        ));
        assert!(!error.is_transient());
    }

    #[test]
    fn test_scope_unresolvable_exposes_source() {
        let error = DriveError::ScopeUnresolvable {
            folder_id: "FX".to_string(),
            source: Box::new(DriveError::NotFound("FX".to_string())),
        };
        let source = std::error::Error::source(&error).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("item 'FX' not found"));
    }
}
