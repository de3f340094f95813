use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    let cli = dailydo::cli::Cli::parse();
    let config = dailydo::config::from_cli(&cli)?;

    let stdout = std::io::stdout();
    let handle = stdout.lock();
    dailydo::commands::execute(&config, cli.command, handle)
}
