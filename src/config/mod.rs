use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub contributions: ContributionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// MongoDB connection string. Falls back to the MONGODB_URI environment
    /// variable; startup fails when neither is present.
    pub uri: Option<String>,
    #[serde(default = "default_db_name")]
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: None,
            name: default_db_name(),
        }
    }
}

fn default_db_name() -> String {
    "fundtracker".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// When set, an admin account is seeded at startup if one does not exist.
    pub admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password: None,
        }
    }
}

fn default_admin_username() -> String {
    "admin".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContributionConfig {
    /// Expected amount per member per month when a contribution is created
    /// without an explicit target.
    #[serde(default = "default_target")]
    pub default_target: f64,
    /// Page size for contribution listings when the request omits `limit`.
    #[serde(default = "default_page_limit")]
    pub default_page_limit: i64,
}

impl Default for ContributionConfig {
    fn default() -> Self {
        Self {
            default_target: default_target(),
            default_page_limit: default_page_limit(),
        }
    }
}

fn default_target() -> f64 {
    300.0
}

fn default_page_limit() -> i64 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    /// Resolve the MongoDB connection string from config or environment.
    pub fn database_uri(&self) -> Result<String> {
        if let Some(uri) = &self.database.uri {
            return Ok(uri.clone());
        }
        if let Ok(uri) = std::env::var("MONGODB_URI") {
            if !uri.is_empty() {
                return Ok(uri);
            }
        }
        bail!("No MongoDB connection string configured: set [database] uri or the MONGODB_URI environment variable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.name, "fundtracker");
        assert_eq!(config.contributions.default_target, 300.0);
        assert_eq!(config.contributions.default_page_limit, 100);
        assert_eq!(config.auth.admin_username, "admin");
        assert!(config.auth.admin_password.is_none());
    }

    #[test]
    fn parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8090

            [database]
            uri = "mongodb://localhost:27017"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database_uri().unwrap(), "mongodb://localhost:27017");
        assert_eq!(config.database.name, "fundtracker");
    }
}
