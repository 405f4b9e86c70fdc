use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ClientDeskError, Result};

pub const ENV_BASE_URL: &str = "CLIENTDESK_BASE_URL";
pub const ENV_ADMIN_USER: &str = "CLIENTDESK_ADMIN_USER";

/// Shape of the basic-auth roster list payload.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RosterEnvelope {
    /// `{"items": [...]}`
    #[default]
    Items,
    /// `[...]`
    Bare,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RosterSourceConfig {
    pub path: String,
    #[serde(default)]
    pub envelope: RosterEnvelope,
}

impl Default for RosterSourceConfig {
    fn default() -> Self {
        Self {
            path: "/admin/clients_list".to_string(),
            envelope: RosterEnvelope::Items,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub admin_user: String,
    pub timeout_seconds: u64,
    /// Page path the session chat posts to (`{chat_page}/chat`).
    pub chat_page: String,
    pub session_storage_key: String,
    pub status_revert_millis: u64,
    pub roster_source: RosterSourceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::convention_defaults()
    }
}

impl Config {
    pub fn convention_defaults() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            admin_user: "admin".to_string(),
            timeout_seconds: 25,
            chat_page: "/ui2/chat".to_string(),
            session_storage_key: "chat_session_id".to_string(),
            status_revert_millis: 2000,
            roster_source: RosterSourceConfig::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ClientDeskError::Config(format!("unable to read {}: {e}", path.display()))
        })?;
        let config: Config =
            serde_json::from_str(&raw).map_err(|e| ClientDeskError::Config(e.to_string()))?;
        config.validated()
    }

    /// Explicit file, then `<app_root>/config.json`, then defaults. Env overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = crate::runtime_paths::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::convention_defaults()
                }
            }
        };
        config
            .with_overrides(|key| std::env::var(key).ok())
            .validated()
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(base_url) = non_empty(ENV_BASE_URL) {
            self.base_url = base_url.trim().to_string();
        }
        if let Some(user) = non_empty(ENV_ADMIN_USER) {
            self.admin_user = user.trim().to_string();
        }
        self
    }

    pub fn validated(mut self) -> Result<Self> {
        let parsed = url::Url::parse(self.base_url.trim())
            .map_err(|e| ClientDeskError::Config(format!("invalid base_url: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientDeskError::Config(format!(
                "base_url must be http or https, got {}",
                parsed.scheme()
            )));
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if self.timeout_seconds == 0 {
            return Err(ClientDeskError::Config(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.session_storage_key.trim().is_empty() {
            return Err(ClientDeskError::Config(
                "session_storage_key cannot be empty".to_string(),
            ));
        }
        if !self.roster_source.path.starts_with('/') {
            self.roster_source.path = format!("/{}", self.roster_source.path);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            json!({
                "base_url": "https://admin.example.com/",
                "roster_source": {"path": "admin/clients", "envelope": "bare"}
            })
            .to_string(),
        )
        .expect("write config");

        let config = Config::from_file(&path).expect("load config");
        assert_eq!(config.base_url, "https://admin.example.com");
        assert_eq!(config.admin_user, "admin");
        assert_eq!(config.session_storage_key, "chat_session_id");
        assert_eq!(config.roster_source.path, "/admin/clients");
        assert_eq!(config.roster_source.envelope, RosterEnvelope::Bare);
    }

    #[test]
    fn env_overrides_skip_blank_values() {
        let config = Config::convention_defaults().with_overrides(|key| match key {
            ENV_BASE_URL => Some("http://10.0.0.5:9000".to_string()),
            ENV_ADMIN_USER => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.admin_user, "admin");
    }

    #[test]
    fn rejects_bad_base_url_and_zero_timeout() {
        let mut config = Config::convention_defaults();
        config.base_url = "ftp://files.example.com".to_string();
        assert!(matches!(
            config.validated(),
            Err(ClientDeskError::Config(message)) if message.contains("http or https")
        ));

        let mut config = Config::convention_defaults();
        config.timeout_seconds = 0;
        assert!(config.validated().is_err());
    }
}
