use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a page synchronously and store the result.
    Extract(ExtractArgs),
    /// List stored content items, newest first.
    List(DbArgs),
    /// Print one stored content item as JSON.
    Show(ItemArgs),
    /// Delete a stored content item and its children.
    Delete(ItemArgs),
    /// Print seed SQL for one stored content item.
    ExportSeed(ItemArgs),
    /// Manage the materials checklist.
    Checklist {
        #[command(subcommand)]
        command: ChecklistCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ChecklistCommand {
    /// Copy an item's materials and required tools onto the checklist.
    Add(ItemArgs),
    /// Print the checklist.
    Show(DbArgs),
    /// Remove every checklist entry.
    Clear(DbArgs),
}

#[derive(Debug, Args)]
pub struct DbArgs {
    /// SQLite database path.
    #[arg(long, default_value = "data/guidebase.sqlite3")]
    pub db: PathBuf,
}

#[derive(Debug, Args)]
pub struct ItemArgs {
    /// Content item id.
    pub id: String,

    #[command(flatten)]
    pub db: DbArgs,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Page URL to extract (must be http/https).
    #[arg(long)]
    pub url: String,

    /// Content kind: tutorial or recipe.
    #[arg(long, default_value = "tutorial")]
    pub kind: String,

    #[command(flatten)]
    pub db: DbArgs,
}
