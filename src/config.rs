use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    pub anon_key: Option<String>,
    pub service_role_key: Option<String>,
    pub access_token: Option<String>,

    #[serde(default = "default_recent_activity_limit")]
    pub recent_activity_limit: usize,

    #[serde(default = "default_avatar_bucket")]
    pub avatar_bucket: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_recent_activity_limit() -> usize {
    5
}

fn default_avatar_bucket() -> String {
    "avatars".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            anon_key: None,
            service_role_key: None,
            access_token: None,
            recent_activity_limit: default_recent_activity_limit(),
            avatar_bucket: default_avatar_bucket(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read the config at `path`, writing defaults there first if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("study-dashboard")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.recent_activity_limit, 5);
        assert_eq!(config.avatar_bucket, "avatars");
    }

    #[test]
    fn partial_file_keeps_defaults_for_absent_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "backend_url = \"https://example.supabase.co\"\nanon_key = \"anon\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.backend_url, "https://example.supabase.co");
        assert_eq!(config.anon_key.as_deref(), Some("anon"));
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.access_token.is_none());
    }
}
