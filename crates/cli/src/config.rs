pub use dailydo_core::config::*;

use crate::cli::Cli;

pub fn from_cli(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::discover(cli.config_dir.clone())?;
    if let Some(vault) = &cli.vault {
        config.override_vault_root(vault.clone());
    }
    Ok(config)
}
