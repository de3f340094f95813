use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;

pub const DEFAULT_SECTION_HEADER: &str = "### 重点事项";

static ENV_CONFIG_DIR: &str = "DAILYDO_CONFIG_DIR";

static VAULT_ROOT_SLOT: &str = "vault_root.txt";
static TEMPLATE_PATH_SLOT: &str = "template_path.txt";
static SECTION_HEADER_SLOT: &str = "section_header.txt";

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("dev", "dailydo", "dailydo"));

/// Application configuration, persisted as plain one-value-per-slot text
/// files in the configuration directory. An absent or empty slot means
/// unset; the section header falls back to [`DEFAULT_SECTION_HEADER`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    config_dir: PathBuf,
    vault_root: Option<PathBuf>,
    template_path: Option<PathBuf>,
    section_header: String,
}

impl AppConfig {
    /// Construct [`AppConfig`] by resolving the configuration directory from
    /// the provided override, environment variables, and platform defaults,
    /// then loading the persisted slots.
    pub fn discover(config_dir_override: Option<PathBuf>) -> Result<Self> {
        let config_dir = resolve_config_dir(config_dir_override)?;
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).with_context(|| {
                format!(
                    "Failed to create config directory at {}",
                    config_dir.display()
                )
            })?;
        }
        Self::from_config_dir(config_dir)
    }

    /// Load the persisted slots from an already-resolved directory.
    pub fn from_config_dir(config_dir: PathBuf) -> Result<Self> {
        let vault_root = read_slot(&config_dir, VAULT_ROOT_SLOT)?.map(PathBuf::from);
        let template_path = read_slot(&config_dir, TEMPLATE_PATH_SLOT)?.map(PathBuf::from);
        let section_header = read_slot(&config_dir, SECTION_HEADER_SLOT)?
            .unwrap_or_else(|| DEFAULT_SECTION_HEADER.to_string());

        Ok(Self {
            config_dir,
            vault_root,
            template_path,
            section_header,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn vault_root(&self) -> Option<&Path> {
        self.vault_root.as_deref()
    }

    pub fn template_path(&self) -> Option<&Path> {
        self.template_path.as_deref()
    }

    pub fn section_header(&self) -> &str {
        &self.section_header
    }

    /// Persist a new vault root and keep it for this instance.
    pub fn set_vault_root(&mut self, path: PathBuf) -> Result<()> {
        write_slot(&self.config_dir, VAULT_ROOT_SLOT, &path.to_string_lossy())?;
        self.vault_root = Some(path);
        Ok(())
    }

    /// Use `path` as the vault root for this instance only, without
    /// touching the persisted slot.
    pub fn override_vault_root(&mut self, path: PathBuf) {
        self.vault_root = Some(path);
    }
}

fn resolve_config_dir(config_dir_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = config_dir_override {
        return Ok(dir);
    }

    if let Ok(env_dir) = env::var(ENV_CONFIG_DIR) {
        return Ok(PathBuf::from(env_dir));
    }

    if let Some(project) = &*PROJECT_DIRS {
        return Ok(project.config_dir().to_path_buf());
    }

    if let Some(base) = BaseDirs::new() {
        return Ok(base.home_dir().join(".dailydo"));
    }

    Ok(env::current_dir()?.join(".dailydo"))
}

fn read_slot(config_dir: &Path, slot: &str) -> Result<Option<String>> {
    let path = config_dir.join(slot);
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let value = raw.trim();
            if value.is_empty() {
                Ok(None)
            } else {
                Ok(Some(value.to_string()))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn write_slot(config_dir: &Path, slot: &str, value: &str) -> Result<()> {
    fs::create_dir_all(config_dir).with_context(|| {
        format!(
            "Failed to create config directory at {}",
            config_dir.display()
        )
    })?;
    let path = config_dir.join(slot);
    fs::write(&path, value).with_context(|| format!("Failed to write {}", path.display()))
}
