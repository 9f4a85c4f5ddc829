use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "staffdesk.toml",
    "config/staffdesk.toml",
    "crates/config/staffdesk.toml",
    "../staffdesk.toml",
    "../config/staffdesk.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
        }
    }
}

/// Where the flat-file stores live on disk.
///
/// ```
/// use staffdesk_config::StorageConfig;
///
/// let storage = StorageConfig::default();
/// assert!(storage.employees_path().ends_with("employees.json"));
/// assert!(storage.users_path().ends_with("UsersData/users.json"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for employee records.
    #[serde(default = "StorageConfig::default_data_dir")]
    pub data_dir: String,
    /// Web root; user accounts live under `<web_root>/UsersData`.
    #[serde(default = "StorageConfig::default_web_root")]
    pub web_root: String,
    /// What to do when a backing file fails to parse.
    #[serde(default)]
    pub on_corrupt: CorruptPolicy,
}

impl StorageConfig {
    fn default_data_dir() -> String {
        "EmployeeData".to_string()
    }

    fn default_web_root() -> String {
        "wwwroot".to_string()
    }

    /// Path of the employee store file.
    pub fn employees_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("employees.json")
    }

    /// Directory holding the user store file.
    pub fn users_dir(&self) -> PathBuf {
        Path::new(&self.web_root).join("UsersData")
    }

    /// Path of the user store file.
    pub fn users_path(&self) -> PathBuf {
        self.users_dir().join("users.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            web_root: Self::default_web_root(),
            on_corrupt: CorruptPolicy::default(),
        }
    }
}

/// Policy applied when a backing file contains unparseable JSON.
///
/// `EmptyCollection` favors availability: the store logs a warning and
/// behaves as if the file were absent. `Fail` surfaces the parse failure to
/// the caller instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptPolicy {
    #[default]
    EmptyCollection,
    Fail,
}

/// Load the application configuration by combining defaults, an optional
/// configuration file, and environment overrides.
///
/// A file can be forced via `STAFFDESK_CONFIG`; otherwise conventional
/// locations relative to the working directory are probed. Environment
/// variables use the `STAFFDESK__` prefix with `__` separators, e.g.
/// `STAFFDESK__STORAGE__DATA_DIR`.
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = StorageConfig::default();

    let mut builder = config::Config::builder();
    builder = builder
        .set_default("storage.data_dir", defaults.data_dir)
        .unwrap()
        .set_default("storage.web_root", defaults.web_root)
        .unwrap()
        .set_default("storage.on_corrupt", "empty_collection")
        .unwrap();

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("STAFFDESK_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via STAFFDESK_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(config::Environment::with_prefix("STAFFDESK").separator("__"));

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
