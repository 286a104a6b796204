//! `download` and `export`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use drivekit::{DriveApi, DriveClient, DriveItem};

#[derive(Args)]
pub struct DownloadArgs {
    /// File id
    pub item_id: String,

    /// Where to save the file (defaults to the file's name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Document id
    pub item_id: String,

    /// Target format, e.g. application/pdf or text/plain
    #[arg(short, long)]
    pub mime_type: String,

    /// Where to save the export (defaults to the document's name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn download<A: DriveApi>(client: &DriveClient<A>, args: &DownloadArgs) -> Result<()> {
    let item = fetch(client, &args.item_id).await?;
    let target = target_path(args.output.as_deref(), &item);
    client
        .download_file_to(&item, &target)
        .await
        .with_context(|| format!("failed to download {}", args.item_id))?;
    println!("{} Saved {}", style("✓").green(), target.display());
    Ok(())
}

pub async fn export<A: DriveApi>(client: &DriveClient<A>, args: &ExportArgs) -> Result<()> {
    let item = fetch(client, &args.item_id).await?;
    let bytes = client
        .export_document(&item, &args.mime_type)
        .await
        .with_context(|| format!("failed to export {}", args.item_id))?;
    let target = target_path(args.output.as_deref(), &item);
    tokio::fs::write(&target, &bytes)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;
    println!(
        "{} Exported {} ({} bytes)",
        style("✓").green(),
        target.display(),
        bytes.len()
    );
    Ok(())
}

async fn fetch<A: DriveApi>(client: &DriveClient<A>, item_id: &str) -> Result<DriveItem> {
    client
        .get_item(item_id)
        .await
        .with_context(|| format!("failed to get item {item_id}"))
}

/// The explicit output path, or the item's name in the current directory.
fn target_path(output: Option<&Path>, item: &DriveItem) -> PathBuf {
    if let Some(path) = output {
        return path.to_path_buf();
    }
    let name = item
        .name()
        .map(|name| name.replace(['/', '\\'], "_"))
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| item.id().to_string());
    PathBuf::from(name)
}
