//! `search`: name or full-text search, optionally scoped to a folder.

use anyhow::{Context, Result};
use clap::Args;
use drivekit::{DriveApi, DriveClient, MatchMode};
use tokio_util::sync::CancellationToken;

use crate::output::{OutputFormat, note_partial, print_items};

#[derive(Args)]
pub struct SearchArgs {
    /// Text to look for
    pub text: String,

    /// Match file content instead of names
    #[arg(short, long)]
    pub content: bool,

    /// Maximum number of results (defaults to the configured search limit)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Only return items inside this folder's subtree
    #[arg(long)]
    pub folder: Option<String>,
}

impl SearchArgs {
    fn mode(&self) -> MatchMode {
        if self.content {
            MatchMode::FullText
        } else {
            MatchMode::Name
        }
    }
}

pub async fn run<A: DriveApi>(
    client: &DriveClient<A>,
    args: &SearchArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let request =
        client.search_request(&args.text, args.mode(), args.limit, args.folder.as_deref());
    let result = client
        .search(&request, Some(cancel))
        .await
        .with_context(|| format!("search for '{}' failed", args.text))?;

    note_partial(result.complete);
    print_items(&result.value, format)
}
