use once_cell::sync::OnceCell;
use sea_orm::{Database, DatabaseConnection};
use std::path::{Path, PathBuf};

use crate::shared::report_builder::repository;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Absolute path for a configured database file; relative paths start at the working directory
pub fn absolute_db_path(db_file: &str) -> anyhow::Result<PathBuf> {
    let path = Path::new(db_file);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// `sqlite://` URL for a file path, with the leading slash Windows drive paths need
pub fn sqlite_url(path: &Path, mode: &str) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    format!("sqlite://{}{}?mode={}", prefix, normalized, mode)
}

/// Open a SQLite file; `mode` is `rwc` for the app database and `ro` for data connections
pub async fn connect_sqlite(db_file: &str, mode: &str) -> anyhow::Result<DatabaseConnection> {
    let absolute_path = absolute_db_path(db_file)?;
    if mode == "rwc" {
        if let Some(parent) = absolute_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Database::connect(sqlite_url(&absolute_path, mode)).await?;
    Ok(conn)
}

/// Open the app database, bootstrap its tables and keep the connection for the process
pub async fn initialize_database(db_path: &str) -> anyhow::Result<()> {
    let conn = connect_sqlite(db_path, "rwc").await?;
    repository::ensure_schema(&conn).await?;
    tracing::info!("App database ready at {}", db_path);

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_url_unix_path() {
        assert_eq!(
            sqlite_url(Path::new("/var/db/app.db"), "rwc"),
            "sqlite:///var/db/app.db?mode=rwc"
        );
    }

    #[test]
    fn test_sqlite_url_windows_path() {
        assert_eq!(
            sqlite_url(Path::new("C:\\data\\crm.db"), "ro"),
            "sqlite:///C:/data/crm.db?mode=ro"
        );
    }
}
