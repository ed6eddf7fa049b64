use contracts::shared::report_builder::{DataSourceType, ReportConfig, ReportDto, SaveReportRequest};
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, FromQueryResult, Statement,
};

use crate::shared::error::{ApiError, ApiResult};

const SELECT_REPORT: &str = r#"
    SELECT id, name, description, connection_key, data_source_type, data_source_name,
           config_json, created_at, updated_at, is_deleted
    FROM reports
"#;

/// Create the `reports` table when missing
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), sea_orm::DbErr> {
    let sql = r#"
        CREATE TABLE IF NOT EXISTS reports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            connection_key TEXT NOT NULL,
            data_source_type TEXT NOT NULL,
            data_source_name TEXT NOT NULL,
            config_json TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            is_deleted INTEGER NOT NULL DEFAULT 0
        )
    "#;
    db.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
        .await?;
    Ok(())
}

#[derive(Debug, Clone, FromQueryResult)]
struct ReportRow {
    id: i64,
    name: String,
    description: Option<String>,
    connection_key: String,
    data_source_type: String,
    data_source_name: String,
    config_json: String,
    created_at: String,
    updated_at: String,
    is_deleted: bool,
}

impl From<ReportRow> for ReportDto {
    fn from(row: ReportRow) -> Self {
        ReportDto {
            id: row.id,
            name: row.name,
            description: row.description,
            connection_key: row.connection_key,
            data_source_type: DataSourceType::parse(&row.data_source_type),
            data_source_name: row.data_source_name,
            config_json: row.config_json,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
            is_deleted: Some(row.is_deleted),
        }
    }
}

/// Trimmed, validated copy of a save request
fn validate(request: &SaveReportRequest) -> ApiResult<SaveReportRequest> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Report name is required".into()));
    }
    let connection_key = request.connection_key.trim();
    if connection_key.is_empty() {
        return Err(ApiError::Validation("Connection is required".into()));
    }
    let data_source_name = request.data_source_name.trim();
    if data_source_name.is_empty() {
        return Err(ApiError::Validation("Data source name is required".into()));
    }
    ReportConfig::from_config_json(&request.config_json)
        .map_err(|e| ApiError::Validation(format!("Invalid configJson: {}", e)))?;

    Ok(SaveReportRequest {
        name: name.to_string(),
        description: request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        connection_key: connection_key.to_string(),
        data_source_type: request.data_source_type,
        data_source_name: data_source_name.to_string(),
        config_json: request.config_json.clone(),
    })
}

/// Reports not deleted, most recently updated first; `search` matches name or description
pub async fn list(db: &DatabaseConnection, search: Option<&str>) -> ApiResult<Vec<ReportDto>> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    let (sql, params): (String, Vec<sea_orm::Value>) = match search {
        Some(q) => {
            let pattern = format!("%{}%", q);
            (
                format!(
                    "{} WHERE is_deleted = 0 AND (name LIKE ? OR description LIKE ?) \
                     ORDER BY updated_at DESC, id DESC",
                    SELECT_REPORT
                ),
                vec![pattern.clone().into(), pattern.into()],
            )
        }
        None => (
            format!(
                "{} WHERE is_deleted = 0 ORDER BY updated_at DESC, id DESC",
                SELECT_REPORT
            ),
            vec![],
        ),
    };

    let stmt = Statement::from_sql_and_values(DatabaseBackend::Sqlite, sql, params);
    let rows = ReportRow::find_by_statement(stmt).all(db).await?;
    Ok(rows.into_iter().map(ReportDto::from).collect())
}

pub async fn get(db: &DatabaseConnection, id: i64) -> ApiResult<ReportDto> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        format!("{} WHERE id = ? AND is_deleted = 0", SELECT_REPORT),
        vec![id.into()],
    );
    ReportRow::find_by_statement(stmt)
        .one(db)
        .await?
        .map(ReportDto::from)
        .ok_or_else(|| ApiError::NotFound(format!("Report {} not found", id)))
}

pub async fn create(db: &DatabaseConnection, request: &SaveReportRequest) -> ApiResult<ReportDto> {
    let request = validate(request)?;
    let now = chrono::Utc::now().to_rfc3339();

    let sql = r#"
        INSERT INTO reports (name, description, connection_key, data_source_type,
                             data_source_name, config_json, created_at, updated_at, is_deleted)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0)
    "#;
    let result = db
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            sql,
            vec![
                request.name.into(),
                request.description.into(),
                request.connection_key.into(),
                request.data_source_type.as_str().into(),
                request.data_source_name.into(),
                request.config_json.into(),
                now.clone().into(),
                now.into(),
            ],
        ))
        .await?;

    let id = result.last_insert_id() as i64;
    tracing::info!("Report {} created", id);
    get(db, id).await
}

pub async fn update(
    db: &DatabaseConnection,
    id: i64,
    request: &SaveReportRequest,
) -> ApiResult<ReportDto> {
    let request = validate(request)?;
    let now = chrono::Utc::now().to_rfc3339();

    let sql = r#"
        UPDATE reports
        SET name = ?, description = ?, connection_key = ?, data_source_type = ?,
            data_source_name = ?, config_json = ?, updated_at = ?
        WHERE id = ? AND is_deleted = 0
    "#;
    let result = db
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            sql,
            vec![
                request.name.into(),
                request.description.into(),
                request.connection_key.into(),
                request.data_source_type.as_str().into(),
                request.data_source_name.into(),
                request.config_json.into(),
                now.into(),
                id.into(),
            ],
        ))
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Report {} not found", id)));
    }
    tracing::info!("Report {} updated", id);
    get(db, id).await
}

/// Soft delete
pub async fn delete(db: &DatabaseConnection, id: i64) -> ApiResult<()> {
    let now = chrono::Utc::now().to_rfc3339();
    let result = db
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE reports SET is_deleted = 1, updated_at = ? WHERE id = ? AND is_deleted = 0",
            vec![now.into(), id.into()],
        ))
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Report {} not found", id)));
    }
    tracing::info!("Report {} deleted", id);
    Ok(())
}
