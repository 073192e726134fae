use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tabula_editor::{SyncConfig, DEFAULT_STORAGE_KEY};

pub const DEFAULT_CONFIG_NAME: &str = "tabula.config.json";

/// Tabula configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Prefix of exported entry names (`<key>-json`, `<key>-html`, ...)
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Directory exports are written to
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Node view timing
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_out_dir() -> String {
    "export".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get absolute path to the export directory
    pub fn get_out_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.out_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            out_dir: default_out_dir(),
            sync: SyncConfig::default(),
        }
    }
}
