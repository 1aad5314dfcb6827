//! Configuration for nodetree
//!
//! Stored in .nodetree/config.toml

use crate::context::{parse_timezone, Locale};
use crate::engine::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// nodetree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Locale used when a request carries no language header
    pub default_locale: String,

    /// IANA timezone used when a request carries no X-Timezone header
    pub default_timezone: String,

    /// Upper bound on the `depth` of a children listing
    pub max_depth: u32,

    /// API server settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            default_timezone: "UTC".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            server: ServerConfig::default(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3847,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Other(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a TOML file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Other(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the server could not run with
    pub fn validate(&self) -> crate::Result<()> {
        if Locale::parse(&self.default_locale).is_none() {
            return Err(crate::Error::Other(format!(
                "Invalid config: default_locale must be a two-letter code, got {:?}",
                self.default_locale
            )));
        }
        parse_timezone(&self.default_timezone)
            .map_err(|e| crate::Error::Other(format!("Invalid config: {}", e)))?;
        if !(1..=MAX_DEPTH_LIMIT).contains(&self.max_depth) {
            return Err(crate::Error::Other(format!(
                "Invalid config: max_depth must be between 1 and {}, got {}",
                MAX_DEPTH_LIMIT, self.max_depth
            )));
        }
        Ok(())
    }

    /// Default locale as a parsed value
    pub fn locale(&self) -> Locale {
        Locale::parse(&self.default_locale).unwrap_or_default()
    }

    /// Generate a default config file with comments
    pub fn default_with_comments() -> String {
        r#"# nodetree configuration

# Locale used when a request has no X-Lang / Accept-Language header
default_locale = "en"

# IANA timezone used when a request has no X-Timezone header
default_timezone = "UTC"

# Upper bound on ?depth for children listings (1 to 128)
max_depth = 64

[server]
host = "127.0.0.1"
port = 3847
"#
        .to_string()
    }
}
