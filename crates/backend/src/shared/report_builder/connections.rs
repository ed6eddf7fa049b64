//! Named data connections reports read from

use contracts::shared::report_builder::ConnectionDto;
use once_cell::sync::OnceCell;
use sea_orm::DatabaseConnection;

use crate::shared::config::Config;
use crate::shared::data::db::connect_sqlite;
use crate::shared::error::{ApiError, ApiResult};

static REGISTRY: OnceCell<ConnectionRegistry> = OnceCell::new();

pub struct ConnectionRegistry {
    entries: Vec<(ConnectionDto, DatabaseConnection)>,
}

impl ConnectionRegistry {
    /// Registry over already opened connections; later duplicates of a key are ignored
    pub fn new(connections: Vec<(ConnectionDto, DatabaseConnection)>) -> Self {
        let mut entries: Vec<(ConnectionDto, DatabaseConnection)> = Vec::new();
        for (info, db) in connections {
            if entries.iter().any(|(known, _)| known.key == info.key) {
                tracing::warn!("Duplicate connection key \"{}\" ignored", info.key);
                continue;
            }
            entries.push((info, db));
        }
        Self { entries }
    }

    /// Open every configured connection read-only; unreachable files are skipped
    pub async fn open(config: &Config) -> Self {
        let mut connections = Vec::new();
        for connection in config.effective_connections() {
            match connect_sqlite(&connection.path, "ro").await {
                Ok(db) => {
                    tracing::info!("Connection \"{}\" opened: {}", connection.key, connection.path);
                    connections.push((
                        ConnectionDto {
                            key: connection.key,
                            label: connection.label,
                        },
                        db,
                    ));
                }
                Err(e) => {
                    tracing::error!(
                        "Connection \"{}\" ({}) could not be opened: {}",
                        connection.key,
                        connection.path,
                        e
                    );
                }
            }
        }
        Self::new(connections)
    }

    pub fn list(&self) -> Vec<ConnectionDto> {
        self.entries.iter().map(|(info, _)| info.clone()).collect()
    }

    pub fn get(&self, key: &str) -> ApiResult<&DatabaseConnection> {
        let key = key.trim();
        self.entries
            .iter()
            .find(|(info, _)| info.key == key)
            .map(|(_, db)| db)
            .ok_or_else(|| ApiError::UnknownConnection(key.to_string()))
    }
}

pub async fn initialize_connections(config: &Config) -> anyhow::Result<()> {
    let registry = ConnectionRegistry::open(config).await;
    tracing::info!("{} data connection(s) available", registry.entries.len());
    REGISTRY
        .set(registry)
        .map_err(|_| anyhow::anyhow!("Connection registry already initialized"))?;
    Ok(())
}

pub fn registry() -> ApiResult<&'static ConnectionRegistry> {
    REGISTRY
        .get()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Connection registry is not initialized")))
}
