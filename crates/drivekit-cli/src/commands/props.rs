//! `props`: set or delete item properties.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use clap::Args;
use console::style;
use drivekit::{DriveApi, DriveClient, PropertyScope};

use crate::output::{OutputFormat, print_json};

#[derive(Args)]
pub struct PropsArgs {
    /// Item id
    pub item_id: String,

    /// `KEY=VALUE` to set a property, `KEY=` to delete it
    #[arg(required = true)]
    pub assignments: Vec<String>,

    /// Write public properties instead of app-private ones
    #[arg(long)]
    pub global: bool,
}

pub async fn run<A: DriveApi>(
    client: &DriveClient<A>,
    args: &PropsArgs,
    format: OutputFormat,
) -> Result<()> {
    let changes = parse_assignments(&args.assignments)?;
    let scope = if args.global {
        PropertyScope::Global
    } else {
        PropertyScope::App
    };

    let item = client
        .update_properties(&args.item_id, &changes, scope)
        .await
        .with_context(|| format!("failed to update properties of {}", args.item_id))?;

    let properties = item.properties(scope);
    match format {
        OutputFormat::Json => print_json(properties),
        OutputFormat::Table => {
            println!(
                "{} Updated {} ({})",
                style("✓").green(),
                item.id(),
                scope.field_name()
            );
            for (key, value) in properties {
                println!("  {key} = {value}");
            }
            Ok(())
        }
    }
}

/// Parses `KEY=VALUE` pairs. An empty value means delete.
fn parse_assignments(assignments: &[String]) -> Result<BTreeMap<String, Option<String>>> {
    let mut changes = BTreeMap::new();
    for assignment in assignments {
        let Some((key, value)) = assignment.split_once('=') else {
            bail!("expected KEY=VALUE or KEY=, got '{assignment}'");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("property key must not be empty in '{assignment}'");
        }
        let value = (!value.is_empty()).then(|| value.to_string());
        changes.insert(key.to_string(), value);
    }
    Ok(changes)
}
