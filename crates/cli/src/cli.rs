use std::path::PathBuf;

use clap::{value_parser, Args, Parser, Subcommand};

use crate::model::TodoTarget;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dailydo",
    version,
    about = "Checkbox todos inside your daily markdown notes.",
    after_help = "Examples:\n  dailydo add Buy milk\n  dailydo toggle today 0\n  dailydo edit 2024-05-01 1 Call the dentist instead\n  dailydo history --json\n  dailydo watch"
)]
pub struct Cli {
    /// Override the configuration directory (defaults to the platform config dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Use this vault root for the invocation without persisting it
    #[arg(long, value_name = "PATH", global = true)]
    pub vault: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// List today's todos (creates today's note from the template if missing)
    List(ListArgs),
    /// List the trailing 30 days with todos, newest first
    History(ListArgs),
    /// Add a new unchecked todo to today's note
    Add(AddArgs),
    /// Check or uncheck a todo by position
    Toggle(ToggleArgs),
    /// Replace a todo's text by position
    Edit(EditArgs),
    /// Remove a todo by position
    Delete(DeleteArgs),
    /// Persist the vault root directory
    SetVault(SetVaultArgs),
    /// Follow today's note: reload on file changes and calendar rollover
    Watch(WatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Emit JSON instead of the human-readable listing
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Todo text (words are joined with single spaces)
    #[arg(value_name = "TEXT", required = true)]
    pub text: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ToggleArgs {
    /// `today` or a YYYY-MM-DD date
    #[arg(value_name = "TARGET", value_parser = parse_target)]
    pub target: TodoTarget,

    /// 0-based position within the section
    #[arg(value_name = "INDEX")]
    pub index: usize,

    /// Uncheck instead of check
    #[arg(long)]
    pub undone: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// `today` or a YYYY-MM-DD date
    #[arg(value_name = "TARGET", value_parser = parse_target)]
    pub target: TodoTarget,

    /// 0-based position within the section
    #[arg(value_name = "INDEX")]
    pub index: usize,

    /// Replacement text (words are joined with single spaces)
    #[arg(value_name = "TEXT", required = true)]
    pub text: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// `today` or a YYYY-MM-DD date
    #[arg(value_name = "TARGET", value_parser = parse_target)]
    pub target: TodoTarget,

    /// 0-based position within the section
    #[arg(value_name = "INDEX")]
    pub index: usize,
}

#[derive(Args, Debug, Clone)]
pub struct SetVaultArgs {
    /// Directory holding the daily notes
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Seconds between calendar rollover checks
    #[arg(long = "rollover-interval", value_name = "SECONDS", default_value_t = 30, value_parser = value_parser!(u64))]
    pub rollover_interval: u64,
}

fn parse_target(raw: &str) -> Result<TodoTarget, String> {
    raw.parse::<TodoTarget>().map_err(|err| err.to_string())
}
