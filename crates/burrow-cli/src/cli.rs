use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "burrow",
    about = "Burrow -- hierarchical keys and consistent multi-document writes",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve an entity kind and identifiers to a store key
    Resolve(ResolveArgs),
    /// List the entity kinds and their key templates
    Kinds,
    /// Build a composite identifier from two parts
    Compose(ComposeArgs),
    /// Show the effective configuration
    Config,
    /// Run a scripted scenario against an in-memory store
    Demo(DemoArgs),
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Entity kind, e.g. `forum` or `ForumName`
    pub kind: String,
    /// Identifiers, outermost first; omit the last for the collection key
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct ComposeArgs {
    pub first: String,
    pub second: String,
}

#[derive(Args)]
pub struct DemoArgs {
    /// Messages to post before the cascading delete
    #[arg(long, default_value = "3")]
    pub messages: usize,
    /// Only plan the final delete instead of running it
    #[arg(long)]
    pub dry_run: bool,
}
