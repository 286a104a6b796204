//! `comments` and `reply`.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use drivekit::{Comment, DriveApi, DriveClient};

use crate::output::{OutputFormat, print_json};

#[derive(Args)]
pub struct CommentsArgs {
    /// File id
    pub file_id: String,

    /// Hide resolved comments
    #[arg(long)]
    pub open_only: bool,
}

#[derive(Args)]
pub struct ReplyArgs {
    /// File id
    pub file_id: String,

    /// Comment id
    pub comment_id: String,

    /// Reply text
    pub content: String,
}

pub async fn list<A: DriveApi>(
    client: &DriveClient<A>,
    args: &CommentsArgs,
    format: OutputFormat,
) -> Result<()> {
    let comments: Vec<Comment> = client
        .get_comments(&args.file_id)
        .await
        .into_iter()
        .filter(|comment| !(args.open_only && comment.resolved))
        .collect();

    if format == OutputFormat::Json {
        return print_json(&comments);
    }
    if comments.is_empty() {
        println!("No comments");
        return Ok(());
    }

    for comment in &comments {
        let status = if comment.resolved {
            style("resolved").dim()
        } else {
            style("open").green()
        };
        println!(
            "{} {} <{}> {} [{status}]",
            style(&comment.id).bold(),
            comment.author,
            comment.author_email,
            comment.created_time
        );
        if !comment.snippet.is_empty() {
            println!("  > {}", comment.snippet);
        }
        println!("  {}", comment.content);
        for reply in &comment.replies {
            println!(
                "    {} {} ({}): {}",
                style("↳").dim(),
                reply.author,
                reply.created_time,
                reply.content
            );
        }
        println!();
    }
    Ok(())
}

pub async fn reply<A: DriveApi>(
    client: &DriveClient<A>,
    args: &ReplyArgs,
    format: OutputFormat,
) -> Result<()> {
    let reply_id = client
        .reply_to_comment(&args.file_id, &args.comment_id, &args.content)
        .await
        .with_context(|| format!("failed to reply to comment {}", args.comment_id))?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "id": reply_id })),
        OutputFormat::Table => {
            println!("{} Posted reply {reply_id}", style("✓").green());
            Ok(())
        }
    }
}
