//! Filter expressions in the service's query grammar.
//!
//! The builders here only produce strings; nothing in drivekit parses them.

/// How the search text is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Substring match on the item name.
    Name,
    /// Full-text match on the item content.
    FullText,
}

impl MatchMode {
    fn field(self) -> &'static str {
        match self {
            MatchMode::Name => "name",
            MatchMode::FullText => "fullText",
        }
    }
}

/// Escapes a value for use inside a single-quoted literal.
///
/// Backslashes are escaped before quotes so the literal always unescapes back
/// to `value`.
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Builds the filter for a name or full-text search.
///
/// With a non-empty `scope`, the base clause is restricted to items whose
/// parent is one of the given folders. An empty scope behaves exactly like no
/// scope.
pub fn build_filter(text: &str, mode: MatchMode, scope: Option<&[String]>) -> String {
    let base = format!(
        "{} contains '{}' and trashed=false",
        mode.field(),
        escape_literal(text)
    );

    match scope {
        Some(folder_ids) if !folder_ids.is_empty() => {
            let parents = folder_ids
                .iter()
                .map(|id| parent_clause(id))
                .collect::<Vec<_>>()
                .join(" or ");
            format!("({base}) and ({parents})")
        }
        _ => base,
    }
}

/// Filter selecting the non-trashed direct children of a folder.
pub fn children_filter(folder_id: &str) -> String {
    format!("{} and trashed=false", parent_clause(folder_id))
}

fn parent_clause(folder_id: &str) -> String {
    format!("'{}' in parents", escape_literal(folder_id))
}
