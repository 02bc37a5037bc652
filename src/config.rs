use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swap: SwapConfig,
    pub enrichment: EnrichmentConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct SwapConfig {
    /// Points credited to each participant when the accepted item carries
    /// no reward value of its own.
    pub default_points: i64,
    /// When enabled, accepting a swap also flips the item to `swapped`
    /// inside the same transaction, blocking further requests against it.
    pub mark_item_swapped: bool,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct EnrichmentConfig {
    /// Endpoint of the item-metadata classification service. Empty means
    /// disabled; the service is advisory either way.
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            swap: SwapConfig::default(),
            enrichment: EnrichmentConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://swapbroker.db".to_string(),
            max_connections: Some(10),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            default_points: crate::rewards::DEFAULT_SWAP_POINTS,
            mark_item_swapped: false,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_seconds: Some(5),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: None,
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| crate::error::SwapError::Config(format!("Failed to read config file: {}", e)))?;

        let config: AppConfig = toml::from_str(&config_str)
            .map_err(|e| crate::error::SwapError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    pub fn load_with_env_overrides<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;

        if let Ok(database_url) = std::env::var("DATABASE_URL") {
            config.database.url = database_url;
        }

        if let Ok(jwt_secret) = std::env::var("JWT_SECRET") {
            config.auth.jwt_secret = jwt_secret;
        }

        if let Ok(endpoint) = std::env::var("ENRICHMENT_ENDPOINT") {
            config.enrichment.endpoint = endpoint;
        }

        if let Ok(log_level) = std::env::var("RUST_LOG") {
            config.logging.level = log_level;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(crate::error::SwapError::Config("Server port cannot be 0".to_string()));
        }

        if self.database.url.is_empty() {
            return Err(crate::error::SwapError::Config("Database URL cannot be empty".to_string()));
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(crate::error::SwapError::Config("JWT secret cannot be empty".to_string()));
        }

        if self.swap.default_points < 0 {
            return Err(crate::error::SwapError::Config(
                "Default swap points cannot be negative".to_string(),
            ));
        }

        Ok(())
    }

    pub fn get_server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.swap.default_points, 25);
        assert!(!config.swap.mark_item_swapped);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());

        config.server.port = 8000;
        config.swap.default_points = -5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_loading() {
        let temp_file = NamedTempFile::new().unwrap();

        let test_config = r#"
[server]
host = "127.0.0.1"
port = 8080

[database]
url = "sqlite://test.db"

[auth]
jwt_secret = "test-secret"

[swap]
default_points = 40
mark_item_swapped = true

[enrichment]
endpoint = ""

[logging]
level = "debug"
"#;

        std::fs::write(temp_file.path(), test_config).unwrap();

        let config = AppConfig::load(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.swap.default_points, 40);
        assert!(config.swap.mark_item_swapped);
        assert!(config.validate().is_ok());
    }
}
