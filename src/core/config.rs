use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const API_KEY_ENV: &str = "METALS_DEV_KEY";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetalsDevProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for MetalsDevProviderConfig {
    fn default() -> Self {
        MetalsDevProviderConfig {
            base_url: "https://api.metals.dev".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub metals_dev: MetalsDevProviderConfig,
}

fn default_currency() -> String {
    "AUD".to_string()
}

fn default_unit() -> String {
    "toz".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Identity used for holdings and notification settings.
    pub user: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "bullion", "bullion")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "bullion", "bullion")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// The market-data credential; the environment overrides the file.
    pub fn api_key(&self) -> Option<String> {
        Self::resolve_api_key(
            std::env::var(API_KEY_ENV).ok(),
            self.providers.metals_dev.api_key.as_deref(),
        )
    }

    fn resolve_api_key(from_env: Option<String>, from_file: Option<&str>) -> Option<String> {
        from_env
            .or_else(|| from_file.map(str::to_string))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}
