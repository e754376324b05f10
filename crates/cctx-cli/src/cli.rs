use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cctx",
    about = "Switch between named settings contexts and merge them with provenance",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Operate on the local project settings (settings.local.json)
    #[arg(long, global = true, conflicts_with = "in_project")]
    pub local: bool,

    /// Operate on the shared project settings (.claude/settings.json)
    #[arg(long, global = true)]
    pub in_project: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List contexts
    List(ListArgs),
    /// Print the current context
    Current,
    /// Create a context from the active settings
    Create(NameArgs),
    /// Switch to a context (`-` switches to the previous one)
    Switch(NameArgs),
    /// Switch to the previous context
    Previous,
    /// Delete a context
    Delete(NameArgs),
    /// Rename a context
    Rename(RenameArgs),
    /// Print a context's settings
    Show(OptionalNameArgs),
    /// Write a context's raw document to stdout
    Export(OptionalNameArgs),
    /// Create a context from JSON on stdin or in a file
    Import(ImportArgs),
    /// Remove the active settings and deactivate the current context
    Unset,
    /// Open a context in an editor
    Edit(OptionalNameArgs),
    /// Merge settings from another context, file, or `user` into a context
    Merge(MergeArgs),
    /// Remove everything previously merged from a source
    Unmerge(UnmergeArgs),
    /// Show a context's merge history
    History(OptionalNameArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Print names only
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct NameArgs {
    pub name: String,
}

#[derive(Args)]
pub struct OptionalNameArgs {
    /// Defaults to the current context
    pub name: Option<String>,
}

#[derive(Args)]
pub struct RenameArgs {
    pub old: String,
    pub new: String,
}

#[derive(Args)]
pub struct ImportArgs {
    pub name: String,
    /// Read JSON from this file instead of stdin
    #[arg(short, long)]
    pub file: Option<String>,
    /// Deep-merge the imported JSON over this document
    #[arg(long)]
    pub prototype: Option<String>,
}

#[derive(Args)]
pub struct MergeArgs {
    /// `user`, a path ending in `.json`, or a context name
    pub source: String,
    /// Context to merge into (default: the active settings)
    #[arg(long, default_value = "current")]
    pub into: String,
    /// Also merge env keys and other top-level settings
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct UnmergeArgs {
    pub source: String,
    /// Context to unmerge from (default: the active settings)
    #[arg(long, default_value = "current")]
    pub from: String,
    /// Also remove merged env keys and other top-level settings
    #[arg(long)]
    pub full: bool,
}
