//! Configuration loading and root folder resolution
//!
//! Missing or malformed configuration never terminates a Dactyl service:
//! it logs a warning and falls back to compiled defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "DACTYL_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "dactyl.db";

/// Default filesystem archive directory inside the root folder
pub const ARCHIVE_DIR_NAME: &str = "archive";

/// Default HTTP bind address for dactyl-capture
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5740";

/// Compiled-in fallback values, used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub bind_address: String,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was built for
    pub fn for_current_platform() -> Self {
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join("dactyl"))
            .unwrap_or_else(|| PathBuf::from("./dactyl_data"));

        Self {
            root_folder,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

/// Archive backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveBackend {
    /// Directory tree on a local or mounted file system
    #[default]
    Filesystem,
    /// In-process store (contents lost on exit)
    Memory,
}

/// `[archive]` section of the TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub backend: ArchiveBackend,
    pub root: Option<PathBuf>,
}

/// `[logging]` section of the TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Language used for user-facing summary messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from an explicit path
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Load from `path` if given, else the platform config location.
    ///
    /// Never fails: a missing or invalid file yields the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        let Some(config_path) = candidate else {
            info!("No config file found, using compiled defaults");
            return Self::default();
        };

        match Self::load(&config_path) {
            Ok(config) => {
                info!("Loaded configuration from {}", config_path.display());
                config
            }
            Err(e) => {
                warn!(
                    "Could not load config {} ({}), using compiled defaults",
                    config_path.display(),
                    e
                );
                Self::default()
            }
        }
    }
}

/// Platform config file location, if one exists
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("dactyl").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/dactyl/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. `DACTYL_ROOT_FOLDER` environment variable
/// 3. TOML `root_folder`
/// 4. Compiled default
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli_arg(mut self, arg: Option<PathBuf>) -> Self {
        self.cli_arg = arg;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_value = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates files inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    /// Filesystem archive root used when none is configured
    pub fn default_archive_root(&self) -> PathBuf {
        self.root_folder.join(ARCHIVE_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::parse(
            r#"
            root_folder = "/srv/dactyl"
            bind_address = "0.0.0.0:8080"
            language = "es"

            [archive]
            backend = "memory"
            root = "/mnt/archive"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.root_folder, Some(PathBuf::from("/srv/dactyl")));
        assert_eq!(config.bind_address.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(config.language, Language::Es);
        assert_eq!(config.archive.backend, ArchiveBackend::Memory);
        assert_eq!(config.archive.root, Some(PathBuf::from("/mnt/archive")));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = TomlConfig::parse("").unwrap();
        assert!(config.root_folder.is_none());
        assert_eq!(config.language, Language::En);
        assert_eq!(config.archive.backend, ArchiveBackend::Filesystem);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_invalid_config_is_config_error() {
        let err = TomlConfig::parse("language = 42").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_database_path_inside_root() {
        let init = RootFolderInitializer::new(PathBuf::from("/tmp/dactyl-root"));
        assert_eq!(
            init.database_path(),
            PathBuf::from("/tmp/dactyl-root").join(DATABASE_FILE_NAME)
        );
    }

    #[test]
    fn test_default_archive_root_follows_resolved_root() {
        let init = RootFolderInitializer::new(PathBuf::from("/srv/other-root"));
        assert_eq!(
            init.default_archive_root(),
            PathBuf::from("/srv/other-root").join(ARCHIVE_DIR_NAME)
        );
    }
}
