use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::api::DEFAULT_BASE_URL;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub default_language: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn save_default_language(language: &str) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.default_language = Some(language.to_string());
        config.save()
    }

    /// Backend base URL: MENTOR_API_URL wins, then the config file, then the
    /// built-in default.
    pub fn resolve_base_url(&self) -> String {
        std::env::var("MENTOR_API_URL")
            .ok()
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("code-mentor").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config {
            api_base_url: Some("http://10.0.0.2:9000".to_string()),
            default_language: Some("rust".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url.as_deref(), Some("http://10.0.0.2:9000"));
        assert_eq!(loaded.default_language.as_deref(), Some("rust"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.api_base_url.is_none());
        assert!(loaded.default_language.is_none());
    }

    #[test]
    fn test_base_url_falls_back_to_default() {
        // Only exercises the file/default legs; the env leg depends on
        // process state.
        if std::env::var("MENTOR_API_URL").is_ok() {
            return;
        }
        let config = Config::new();
        assert_eq!(config.resolve_base_url(), DEFAULT_BASE_URL);

        let config = Config {
            api_base_url: Some("http://example.com".to_string()),
            default_language: None,
        };
        assert_eq!(config.resolve_base_url(), "http://example.com");
    }
}
