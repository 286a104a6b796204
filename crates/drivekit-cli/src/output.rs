//! Table and JSON rendering shared by every command.

use anyhow::Result;
use console::style;
use drivekit::{DriveItem, ItemKind};
use serde::Serialize;

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable columns
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints items as a table or JSON array.
pub fn print_items(items: &[DriveItem], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(items);
    }
    if items.is_empty() {
        println!("No items found");
        return Ok(());
    }

    println!(
        "{:<44} {:<14} {:<17} {}",
        style("ID").bold(),
        style("TYPE").bold(),
        style("MODIFIED").bold(),
        style("NAME").bold()
    );
    println!("{}", "-".repeat(100));
    for item in items {
        println!("{}", item_row(item));
    }
    println!("\n{} {} item(s)", style("✓").green(), items.len());
    Ok(())
}

/// Prints a note when a result was cut short by Ctrl-C.
pub fn note_partial(complete: bool) {
    if !complete {
        eprintln!("{} interrupted, showing partial results", style("!").yellow());
    }
}

fn item_row(item: &DriveItem) -> String {
    let kind = item.kind().map_or("unknown", ItemKind::as_str);
    let modified = item
        .modified_time()
        .map_or_else(String::new, |t| t.format("%Y-%m-%d %H:%M").to_string());
    let name = truncate(item.name().unwrap_or_default(), 40);
    format!("{:<44} {kind:<14} {modified:<17} {name}", item.id())
}

/// Shortens `text` to at most `max` characters, ending in "..." when cut.
pub fn truncate(text: &str, max: usize) -> String {
    const ELLIPSIS: &str = "...";

    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_none() {
        return head;
    }
    let prefix: String = head.chars().take(max.saturating_sub(ELLIPSIS.len())).collect();
    format!("{prefix}{ELLIPSIS}")
}
