//! Subcommand implementations for the `drivekit` CLI.
//!
//! Each module exports the `clap::Args` structs for its subcommands and one
//! async function per subcommand taking the connected client, the parsed
//! arguments and the output format.

pub mod account;
pub mod comments;
pub mod content;
pub mod items;
pub mod props;
pub mod search;
