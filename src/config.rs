//! Runtime configuration for foutbot
//!
//! A small YAML file with serde defaults; every field is optional. The bot
//! token always comes from the environment and never lives in the file or in
//! source.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable carrying the bot token.
pub const TOKEN_ENV: &str = "FOUTBOT_TOKEN";

/// Environment variable overriding the config file location.
const CONFIG_PATH_ENV: &str = "FOUTBOT_CONFIG";

const CONFIG_FILE_NAME: &str = "foutbot.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("{TOKEN_ENV} is not set")]
    MissingToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The knowledge-base workbook.
    #[serde(default = "default_workbook_path")]
    pub workbook_path: PathBuf,

    /// The append-only interaction log.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// When true, only usernames from the `gebruikers` sheet get answers.
    #[serde(default)]
    pub require_authorization: bool,

    /// Long-poll window for `getUpdates`, in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_workbook_path() -> PathBuf {
    PathBuf::from("modules_met_uitleg.xlsx")
}

fn default_log_path() -> PathBuf {
    PathBuf::from("user_logs.csv")
}

fn default_poll_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workbook_path: default_workbook_path(),
            log_path: default_log_path(),
            require_authorization: false,
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

impl Config {
    /// Load the configuration from the first location that exists:
    /// `$FOUTBOT_CONFIG`, `./foutbot.yaml`, or the per-user config directory.
    /// Falls back to the defaults when no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_path(Path::new(&path));
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::from_path(&local);
        }

        if let Some(dir) = dirs::config_dir() {
            let user = dir.join("foutbot").join(CONFIG_FILE_NAME);
            if user.exists() {
                return Self::from_path(&user);
            }
        }

        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "poll_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.workbook_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("workbook_path cannot be empty".into()));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("log_path cannot be empty".into()));
        }
        Ok(())
    }

    /// Read the bot token from the environment.
    pub fn token() -> Result<String, ConfigError> {
        std::env::var(TOKEN_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
workbook_path: kb/modules.xlsx
log_path: /var/log/foutbot/interacties.csv
require_authorization: true
poll_timeout_secs: 60
"#;

        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.workbook_path, PathBuf::from("kb/modules.xlsx"));
        assert!(config.require_authorization);
        assert_eq!(config.poll_timeout_secs, 60);
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config.workbook_path, PathBuf::from("modules_met_uitleg.xlsx"));
        assert_eq!(config.log_path, PathBuf::from("user_logs.csv"));
        assert!(!config.require_authorization);
        assert_eq!(config.poll_timeout_secs, 30);
    }

    #[test]
    fn test_zero_poll_timeout_rejected() {
        let result = Config::parse("poll_timeout_secs: 0");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_empty_workbook_path_rejected() {
        let result = Config::parse("workbook_path: \"\"");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
