use serde::Deserialize;

/// Key under which the app database is exposed when no connection is configured
pub const APP_CONNECTION_KEY: &str = "app";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Named SQLite data connections reports can read from
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    pub path: String,
}

impl Config {
    /// Configured connections, or the app database alone when none are listed
    pub fn effective_connections(&self) -> Vec<ConnectionConfig> {
        if !self.connections.is_empty() {
            return self.connections.clone();
        }
        vec![ConnectionConfig {
            key: APP_CONNECTION_KEY.to_string(),
            label: Some("Application database".to_string()),
            path: self.database.path.clone(),
        }]
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/app.db"

[server]
port = 3000
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "target/db/app.db");
        assert_eq!(config.server.port, 3000);
        assert!(config.connections.is_empty());
    }

    #[test]
    fn test_app_database_is_the_fallback_connection() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        let connections = config.effective_connections();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].key, APP_CONNECTION_KEY);
        assert_eq!(connections[0].path, "target/db/app.db");
    }

    #[test]
    fn test_connections_section() {
        let config: Config = toml::from_str(
            r#"
            [database]
            path = "app.db"

            [[connections]]
            key = "crm"
            label = "CRM"
            path = "/data/crm.db"

            [[connections]]
            key = "erp"
            path = "erp.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 3000);
        let connections = config.effective_connections();
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0].label.as_deref(), Some("CRM"));
        assert_eq!(connections[1].label, None);
    }
}
