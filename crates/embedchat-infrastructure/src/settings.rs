//! Settings file storage.
//!
//! Settings come from `~/.config/embedchat/config.toml`, overridden by
//! environment variables, and are turned into a [`WidgetConfig`] once at
//! startup.

use crate::paths::EmbedchatPaths;
use embedchat_core::config::{DEFAULT_REQUEST_TIMEOUT, WidgetConfig};
use embedchat_core::error::{ConfigError, EmbedchatError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/chat";
pub const ENV_ENDPOINT: &str = "EMBEDCHAT_ENDPOINT";
pub const ENV_CLIENT_ID: &str = "EMBEDCHAT_CLIENT_ID";
pub const ENV_TIMEOUT_SECS: &str = "EMBEDCHAT_TIMEOUT_SECS";

/// User-editable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    pub client_id: Option<String>,
    /// `src` of the embed script; defaults to `<origin>/static/widget.js`.
    pub script_src: Option<String>,
    pub request_timeout_secs: u64,
    pub greeting: Option<String>,
    pub error_message: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client_id: None,
            script_src: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            greeting: None,
            error_message: None,
        }
    }
}

impl Settings {
    /// Applies overrides from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup` (environment-shaped).
    ///
    /// An unparsable timeout is ignored with a warning.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(client_id) = lookup(ENV_CLIENT_ID) {
            self.client_id = Some(client_id);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => tracing::warn!(value = %raw, "ignoring invalid {ENV_TIMEOUT_SECS}"),
            }
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Builds the immutable widget configuration.
    pub fn widget_config(&self) -> std::result::Result<WidgetConfig, ConfigError> {
        let mut config = WidgetConfig::new(self.client_id.as_deref(), self.endpoint.clone())?
            .with_request_timeout(self.request_timeout());
        if let Some(greeting) = &self.greeting {
            config = config.with_greeting(greeting.clone());
        }
        if let Some(message) = &self.error_message {
            config = config.with_error_message(message.clone());
        }
        Ok(config)
    }

    /// The embed script `src`, derived from the endpoint origin if unset.
    pub fn script_src(&self, config: &WidgetConfig) -> String {
        self.script_src
            .clone()
            .unwrap_or_else(|| format!("{}/static/widget.js", config.origin()))
    }
}

/// Reads [`Settings`] from a TOML file.
pub struct SettingsStorage {
    path: PathBuf,
}

impl SettingsStorage {
    /// Storage at the default path (`~/.config/embedchat/config.toml`).
    pub fn new() -> Result<Self> {
        let path = EmbedchatPaths::config_file().map_err(|e| EmbedchatError::io(e.to_string()))?;
        Ok(Self { path })
    }

    /// Storage at a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads settings; a missing or empty file yields the defaults.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no settings file, using defaults");
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        Ok(toml::from_str(&content)?)
    }

    /// Writes settings, creating the config directory if needed.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string_pretty(settings)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SettingsStorage::with_path(temp_dir.path().join("config.toml"));
        assert_eq!(storage.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
endpoint = "https://bot.example.com/api/chat"
client_id = "acme"
"#,
        )
        .unwrap();

        let settings = SettingsStorage::with_path(path).load().unwrap();
        assert_eq!(settings.endpoint, "https://bot.example.com/api/chat");
        assert_eq!(settings.client_id.as_deref(), Some("acme"));
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "endpoint = ").unwrap();

        let err = SettingsStorage::with_path(path).load().unwrap_err();
        assert!(matches!(err, EmbedchatError::Serialization { .. }));
    }

    #[test]
    fn test_save_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SettingsStorage::with_path(temp_dir.path().join("sub").join("config.toml"));
        let settings = Settings {
            client_id: Some("acme".into()),
            ..Settings::default()
        };
        storage.save(&settings).unwrap();
        assert_eq!(storage.load().unwrap(), settings);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_ENDPOINT, "https://bot.example.com/api/chat"),
            (ENV_CLIENT_ID, "from-env"),
            (ENV_TIMEOUT_SECS, "12"),
        ]);
        let settings = Settings::default()
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.client_id.as_deref(), Some("from-env"));
        assert_eq!(settings.request_timeout(), Duration::from_secs(12));

        let config = settings.widget_config().unwrap();
        assert_eq!(config.endpoint(), "https://bot.example.com/api/chat");
        assert_eq!(settings.script_src(&config), "https://bot.example.com/static/widget.js");
    }

    #[test]
    fn test_invalid_timeout_override_is_ignored() {
        let settings = Settings::default().apply_overrides(|key| {
            (key == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn test_widget_config_requires_client_id() {
        assert_eq!(
            Settings::default().widget_config().unwrap_err(),
            ConfigError::MissingClientId
        );
    }
}
