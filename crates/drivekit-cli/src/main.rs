//! Command-line front-end for drivekit.
//!
//! Usage:
//! ```bash
//! drivekit whoami                          # Show the authenticated user
//! drivekit drives                          # List My Drive and shared drives
//! drivekit get <id>                        # Show one item
//! drivekit list <folder>                   # List a folder's children
//! drivekit search <text> [--content]       # Search names or content
//! drivekit folders <root>                  # Every folder below a root
//! drivekit download <id> [--output path]   # Save a binary file
//! drivekit export <id> --mime-type <type>  # Export a structured document
//! drivekit comments <id>                   # Show comments and replies
//! drivekit reply <file> <comment> <text>   # Reply to a comment
//! drivekit props <id> KEY=VALUE KEY=       # Set or delete properties
//! drivekit labels <id>                     # Show applied labels
//! drivekit access <id>                     # Check item visibility
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drivekit::{DriveClient, DriveConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "drivekit", author, version, about)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    /// Path to a drivekit.toml (overrides discovery)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Access token (overrides the config file and DRIVEKIT_ACCESS_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the authenticated user
    Whoami,

    /// List My Drive and every shared drive
    Drives,

    /// Show one item
    Get(commands::items::ItemArgs),

    /// List the direct children of a folder
    List(commands::items::ListArgs),

    /// Search item names or content
    Search(commands::search::SearchArgs),

    /// Resolve every folder below a root folder
    Folders(commands::items::FoldersArgs),

    /// Download the content of a binary file
    Download(commands::content::DownloadArgs),

    /// Export a structured document
    Export(commands::content::ExportArgs),

    /// Show the comments on a file
    Comments(commands::comments::CommentsArgs),

    /// Reply to a comment
    Reply(commands::comments::ReplyArgs),

    /// Set or delete item properties
    Props(commands::props::PropsArgs),

    /// Show the labels applied to an item
    Labels(commands::items::ItemArgs),

    /// Check whether the current user can see an item
    Access(commands::items::ItemArgs),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Whoami => f.debug_tuple("Whoami").finish(),
            Self::Drives => f.debug_tuple("Drives").finish(),
            Self::Get(_) => f.debug_tuple("Get").finish(),
            Self::List(_) => f.debug_tuple("List").finish(),
            Self::Search(_) => f.debug_tuple("Search").finish(),
            Self::Folders(_) => f.debug_tuple("Folders").finish(),
            Self::Download(_) => f.debug_tuple("Download").finish(),
            Self::Export(_) => f.debug_tuple("Export").finish(),
            Self::Comments(_) => f.debug_tuple("Comments").finish(),
            Self::Reply(_) => f.debug_tuple("Reply").finish(),
            Self::Props(_) => f.debug_tuple("Props").finish(),
            Self::Labels(_) => f.debug_tuple("Labels").finish(),
            Self::Access(_) => f.debug_tuple("Access").finish(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("info".parse().context("failed to parse log directive")?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.token.clone())?;
    let client = DriveClient::from_config(&config)
        .await
        .context("failed to connect to drive")?;
    let cancel = cancel_on_ctrl_c();
    let format = cli.format;

    match &cli.command {
        Command::Whoami => commands::account::whoami(&client, format),
        Command::Drives => commands::account::drives(&client, format),
        Command::Get(args) => commands::items::get(&client, args, format).await,
        Command::List(args) => commands::items::list(&client, args, format, &cancel).await,
        Command::Search(args) => commands::search::run(&client, args, format, &cancel).await,
        Command::Folders(args) => commands::items::folders(&client, args, format, &cancel).await,
        Command::Download(args) => commands::content::download(&client, args).await,
        Command::Export(args) => commands::content::export(&client, args).await,
        Command::Comments(args) => commands::comments::list(&client, args, format).await,
        Command::Reply(args) => commands::comments::reply(&client, args, format).await,
        Command::Props(args) => commands::props::run(&client, args, format).await,
        Command::Labels(args) => commands::items::labels(&client, args, format).await,
        Command::Access(args) => commands::items::access(&client, args, format).await,
    }
}

/// Loads the configuration from `path`, or by discovery, and applies the
/// token overrides. `--token` wins over the environment.
fn load_config(path: Option<&std::path::Path>, token: Option<String>) -> Result<DriveConfig> {
    let config = match path {
        Some(path) => DriveConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => DriveConfig::resolve()
            .context("failed to resolve drivekit config")?
            .unwrap_or_default(),
    };
    debug!(endpoint = %config.endpoint, "Using drive endpoint");
    Ok(config
        .with_token_override(std::env::var(drivekit::ACCESS_TOKEN_ENV).ok())
        .with_token_override(token))
}

/// Returns a token that is cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, finishing with partial results");
            child.cancel();
        }
    });
    token
}
