//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`DISPATCH_ROOT_FOLDER`, then `DISPATCH_ROOT`)
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or malformed TOML file never stops startup; it is logged and the
//! compiled defaults are used.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Primary root folder environment variable
pub const ROOT_FOLDER_ENV: &str = "DISPATCH_ROOT_FOLDER";
/// Alternate root folder environment variable
pub const ROOT_ENV: &str = "DISPATCH_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "dispatch.db";
/// Uploaded Word template file name inside the root folder
pub const TEMPLATE_FILE: &str = "template.docx";

pub const DEFAULT_BIN_RETENTION_DAYS: i64 = 30;
/// Upper bound on bin retention (about a century)
pub const MAX_BIN_RETENTION_DAYS: i64 = 36_500;
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Per-module TOML configuration file contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bin_retention_days: Option<i64>,
    pub purge_interval_secs: Option<u64>,
    pub list_limit: Option<i64>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load the module's config file, falling back to defaults on any problem
    pub fn load_or_default(module_name: &str) -> Self {
        let Some(path) = config_file_path(module_name) else {
            debug!("No config file found for {}, using defaults", module_name);
            return Self::default();
        };

        match std::fs::read_to_string(&path)
            .map_err(Error::from)
            .and_then(|text| Self::from_toml_str(&text))
        {
            Ok(config) => {
                debug!("Loaded config file {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Compiled-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
        }
    }
}

/// Runtime settings derived from the TOML file and defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Days a soft-deleted record stays in the recycle bin
    pub bin_retention_days: i64,
    /// Seconds between background purge runs
    pub purge_interval_secs: u64,
    /// Maximum records returned by one list query
    pub list_limit: i64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            bin_retention_days: DEFAULT_BIN_RETENTION_DAYS,
            purge_interval_secs: DEFAULT_PURGE_INTERVAL_SECS,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl From<&TomlConfig> for ServiceSettings {
    fn from(config: &TomlConfig) -> Self {
        let defaults = Self::default();
        Self {
            bin_retention_days: match config.bin_retention_days {
                Some(days) if (1..=MAX_BIN_RETENTION_DAYS).contains(&days) => days,
                Some(days) => {
                    warn!(
                        "bin_retention_days {} outside 1..={}, using {}",
                        days, MAX_BIN_RETENTION_DAYS, defaults.bin_retention_days
                    );
                    defaults.bin_retention_days
                }
                None => defaults.bin_retention_days,
            },
            purge_interval_secs: config
                .purge_interval_secs
                .filter(|s| *s > 0)
                .unwrap_or(defaults.purge_interval_secs),
            list_limit: config
                .list_limit
                .filter(|l| *l > 0)
                .unwrap_or(defaults.list_limit),
        }
    }
}

/// Resolves the root folder for a module
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
        }
    }

    /// Command-line override, takes priority over everything else
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        for var in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        if let Some(root) = TomlConfig::load_or_default(&self.module_name).root_folder {
            return root;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the root folder and derives file locations inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder if missing (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    pub fn template_path(&self) -> PathBuf {
        self.root_folder.join(TEMPLATE_FILE)
    }
}

/// Locate the module's config file: user config dir first, then /etc on Linux
fn config_file_path(module_name: &str) -> Option<PathBuf> {
    let file_name = format!("{}.toml", module_name);

    let user_config = dirs::config_dir().map(|d| d.join("dispatch").join(&file_name));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/dispatch").join(&file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("dispatch"))
        .unwrap_or_else(|| PathBuf::from("./dispatch_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_config_parses_all_keys() {
        let config = TomlConfig::from_toml_str(
            r#"
            root_folder = "/srv/dispatch"
            bin_retention_days = 7
            purge_interval_secs = 60
            list_limit = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.root_folder, Some(PathBuf::from("/srv/dispatch")));
        let settings = ServiceSettings::from(&config);
        assert_eq!(settings.bin_retention_days, 7);
        assert_eq!(settings.purge_interval_secs, 60);
        assert_eq!(settings.list_limit, 50);
    }

    #[test]
    fn test_toml_config_empty_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(ServiceSettings::from(&config), ServiceSettings::default());
    }

    #[test]
    fn test_non_positive_values_fall_back() {
        let config = TomlConfig::from_toml_str("bin_retention_days = 0\nlist_limit = -5").unwrap();
        let settings = ServiceSettings::from(&config);
        assert_eq!(settings.bin_retention_days, DEFAULT_BIN_RETENTION_DAYS);
        assert_eq!(settings.list_limit, DEFAULT_LIST_LIMIT);
    }

    #[test]
    fn test_oversized_retention_falls_back() {
        let config = TomlConfig::from_toml_str("bin_retention_days = 200000000000").unwrap();
        assert_eq!(ServiceSettings::from(&config).bin_retention_days, DEFAULT_BIN_RETENTION_DAYS);

        let config = TomlConfig::from_toml_str("bin_retention_days = 36500").unwrap();
        assert_eq!(ServiceSettings::from(&config).bin_retention_days, MAX_BIN_RETENTION_DAYS);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("root_folder = [");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_arg_wins() {
        let resolver = RootFolderResolver::new("test-module")
            .with_cli_arg(Some(PathBuf::from("/tmp/dispatch-cli")));
        assert_eq!(resolver.resolve(), PathBuf::from("/tmp/dispatch-cli"));
    }
}
