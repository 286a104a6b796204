//! Item lookups: `get`, `list`, `folders`, `labels` and `access`.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use drivekit::{DriveApi, DriveClient, ItemKind, PropertyScope};
use tokio_util::sync::CancellationToken;

use crate::output::{OutputFormat, note_partial, print_items, print_json};

#[derive(Args)]
pub struct ItemArgs {
    /// Item id
    pub item_id: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Folder id ("root" for My Drive)
    pub folder_id: String,

    /// Maximum number of children to list
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct FoldersArgs {
    /// Root folder id
    pub root_id: String,
}

pub async fn get<A: DriveApi>(
    client: &DriveClient<A>,
    args: &ItemArgs,
    format: OutputFormat,
) -> Result<()> {
    let item = client
        .get_item(&args.item_id)
        .await
        .with_context(|| format!("failed to get item {}", args.item_id))?;

    if format == OutputFormat::Json {
        return print_json(&item);
    }

    println!("{} {}", style("ID:      ").bold(), item.id());
    println!("{} {}", style("Name:    ").bold(), item.name().unwrap_or("-"));
    println!(
        "{} {}",
        style("Type:    ").bold(),
        item.kind().map_or("unknown", ItemKind::as_str)
    );
    println!("{} {}", style("Owner:   ").bold(), item.owner().unwrap_or("-"));
    if let Some(modified) = item.modified_time() {
        println!("{} {}", style("Modified:").bold(), modified.to_rfc3339());
    }
    if let Some(permission) = item.permissions().first() {
        println!(
            "{} edit={} comment={} view={}",
            style("Access:  ").bold(),
            permission.can_edit,
            permission.can_comment,
            permission.can_view
        );
    }
    for (scope, label) in [
        (PropertyScope::Global, "Properties"),
        (PropertyScope::App, "App properties"),
    ] {
        let properties = item.properties(scope);
        if !properties.is_empty() {
            println!("{}", style(label).bold());
            for (key, value) in properties {
                println!("  {key} = {value}");
            }
        }
    }
    Ok(())
}

pub async fn list<A: DriveApi>(
    client: &DriveClient<A>,
    args: &ListArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let result = client
        .list_items_cancellable(&args.folder_id, args.limit, Some(cancel))
        .await
        .with_context(|| format!("failed to list folder {}", args.folder_id))?;
    note_partial(result.complete);
    print_items(&result.value, format)
}

pub async fn folders<A: DriveApi>(
    client: &DriveClient<A>,
    args: &FoldersArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let result = client
        .resolve_folder_closure(&args.root_id, Some(cancel))
        .await
        .context("failed to resolve folders")?;
    note_partial(result.complete);
    let closure = result.value;

    if format == OutputFormat::Json {
        let failures: Vec<_> = closure
            .failures()
            .iter()
            .map(|f| serde_json::json!({ "folder_id": f.folder_id, "error": f.error.to_string() }))
            .collect();
        return print_json(&serde_json::json!({
            "root_id": closure.root_id(),
            "folders": closure.folder_ids(),
            "failures": failures,
            "complete": result.complete,
        }));
    }

    for folder_id in closure.folder_ids() {
        println!("{folder_id}");
    }
    for failure in closure.failures() {
        eprintln!(
            "{} could not list {}: {}",
            style("!").yellow(),
            failure.folder_id,
            failure.error
        );
    }
    println!("\n{} {} folder(s)", style("✓").green(), closure.len());
    Ok(())
}

pub async fn labels<A: DriveApi>(
    client: &DriveClient<A>,
    args: &ItemArgs,
    format: OutputFormat,
) -> Result<()> {
    let labels = client
        .get_labels(&args.item_id)
        .await
        .with_context(|| format!("failed to get labels for {}", args.item_id))?;

    match format {
        OutputFormat::Json => print_json(&labels),
        OutputFormat::Table if labels.is_empty() => {
            println!("No labels applied");
            Ok(())
        }
        OutputFormat::Table => {
            for label in &labels {
                let id = label.get("id").and_then(serde_json::Value::as_str).unwrap_or("-");
                println!("{id}");
            }
            Ok(())
        }
    }
}

pub async fn access<A: DriveApi>(
    client: &DriveClient<A>,
    args: &ItemArgs,
    format: OutputFormat,
) -> Result<()> {
    let accessible = client.check_item_access(&args.item_id).await;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "item_id": args.item_id,
            "accessible": accessible,
        })),
        OutputFormat::Table => {
            if accessible {
                println!("{} {} is accessible", style("✓").green(), args.item_id);
            } else {
                println!("{} {} is not accessible", style("✗").red(), args.item_id);
            }
            Ok(())
        }
    }
}
