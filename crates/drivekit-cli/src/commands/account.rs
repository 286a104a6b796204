//! `whoami` and `drives`.

use anyhow::Result;
use console::style;
use drivekit::{DriveApi, DriveClient};

use crate::output::{OutputFormat, print_json};

pub fn whoami<A: DriveApi>(client: &DriveClient<A>, format: OutputFormat) -> Result<()> {
    let user = client.user_info();
    match format {
        OutputFormat::Json => print_json(user),
        OutputFormat::Table => {
            println!("{} {}", style("Name: ").bold(), user.name);
            println!("{} {}", style("Email:").bold(), user.email);
            println!("{} {}", style("ID:   ").bold(), user.id);
            Ok(())
        }
    }
}

pub fn drives<A: DriveApi>(client: &DriveClient<A>, format: OutputFormat) -> Result<()> {
    let drives = client.drives();
    match format {
        OutputFormat::Json => print_json(drives),
        OutputFormat::Table => {
            println!("{:<44} {}", style("ID").bold(), style("NAME").bold());
            println!("{}", "-".repeat(70));
            for drive in drives {
                println!("{:<44} {}", drive.id, drive.name.as_deref().unwrap_or("-"));
            }
            Ok(())
        }
    }
}
