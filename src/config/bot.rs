//! Bot settings loaded from config.toml
//!
//! The file is optional: a missing config.toml yields the defaults. The
//! `COMMAND_PREFIX` environment variable overrides the configured prefix.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Prefix used when neither the guild nor the configuration sets one
pub const DEFAULT_PREFIX: &str = ">>";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BotConfig {
    /// Fallback prefix for prefix commands
    #[serde(default = "default_prefix")]
    pub command_prefix: String,
    /// Discord user IDs allowed to run developer commands
    #[serde(default)]
    pub developers: Vec<u64>,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_prefix(),
            developers: Vec::new(),
        }
    }
}

impl BotConfig {
    /// Whether `user_id` is listed as a developer.
    #[must_use]
    pub fn is_developer(&self, user_id: u64) -> bool {
        self.developers.contains(&user_id)
    }

    fn with_env_overrides(mut self) -> Self {
        match std::env::var("COMMAND_PREFIX") {
            Ok(prefix) if !prefix.trim().is_empty() => self.command_prefix = prefix,
            _ => {}
        }
        self
    }
}

/// Loads bot configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BotConfig> {
    let path = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<BotConfig> {
    let config: BotConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    if config.command_prefix.trim().is_empty() {
        return Err(Error::Config {
            message: "command_prefix cannot be empty".to_string(),
        });
    }
    Ok(config)
}

/// Loads ./config.toml when present, falling back to defaults, then applies env overrides.
pub fn load_default_config() -> Result<BotConfig> {
    let path = Path::new("config.toml");
    let config = if path.exists() {
        load_config(path)?
    } else {
        tracing::info!("No config.toml found, using default bot configuration");
        BotConfig::default()
    };
    Ok(config.with_env_overrides())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_bot_config() {
        let config = parse_config(
            r#"
            command_prefix = "!"
            developers = [711194921683648523]
            "#,
        )
        .unwrap();
        assert_eq!(config.command_prefix, "!");
        assert!(config.is_developer(711_194_921_683_648_523));
        assert!(!config.is_developer(1));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, BotConfig::default());
        assert_eq!(config.command_prefix, DEFAULT_PREFIX);
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        assert!(matches!(
            parse_config("command_prefix = \"  \""),
            Err(Error::Config { .. })
        ));
        assert!(parse_config("command_prefix = [").is_err());
    }
}
