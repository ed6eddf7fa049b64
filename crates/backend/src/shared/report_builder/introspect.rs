//! Data-source discovery against SQLite: existence check plus column schema

use contracts::shared::report_builder::{CheckDataSourceResponse, DataSourceType, Field};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

use super::query_builder::quote_ident;

pub const FUNCTIONS_UNSUPPORTED: &str =
    "SQLite connections have no table-valued functions; use a view";

/// Source and host type names for a declared SQLite column type
pub fn map_declared_type(declared: &str) -> (String, &'static str) {
    let sql_type = if declared.trim().is_empty() {
        "TEXT".to_string()
    } else {
        declared.trim().to_uppercase()
    };
    let t = sql_type.as_str();

    // Affinity rules first, then the date/bool/blob refinements
    let dot_net_type = if t.contains("BOOL") {
        "Boolean"
    } else if t.contains("DATE") || t.contains("TIME") {
        "DateTime"
    } else if t.contains("INT") {
        "Int64"
    } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
        "String"
    } else if t.contains("BLOB") {
        "Byte[]"
    } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
        "Double"
    } else if t.contains("NUMERIC") || t.contains("DECIMAL") || t.contains("MONEY") {
        "Decimal"
    } else {
        "String"
    };
    (sql_type, dot_net_type)
}

/// Whether a view (or plain table) with this exact name exists
pub async fn source_exists(db: &DatabaseConnection, name: &str) -> Result<bool, sea_orm::DbErr> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "SELECT name FROM sqlite_master WHERE type IN ('view', 'table') AND name = ?",
        vec![name.into()],
    );
    Ok(db.query_one(stmt).await?.is_some())
}

/// Columns of an existing view or table, in declaration order
pub async fn read_columns(db: &DatabaseConnection, name: &str) -> Result<Vec<Field>, sea_orm::DbErr> {
    let sql = format!("PRAGMA table_info({})", quote_ident(name));
    let rows = db
        .query_all(Statement::from_string(DatabaseBackend::Sqlite, sql))
        .await?;

    let mut fields = Vec::with_capacity(rows.len());
    for row in rows {
        let column: String = row.try_get("", "name")?;
        let declared: String = row
            .try_get::<Option<String>>("", "type")?
            .unwrap_or_default();
        let not_null: i64 = row.try_get("", "notnull").unwrap_or(0);
        let (sql_type, dot_net_type) = map_declared_type(&declared);
        fields.push(Field {
            name: column,
            sql_type,
            dot_net_type: dot_net_type.to_string(),
            is_nullable: not_null == 0,
        });
    }
    Ok(fields)
}

/// Schema of a data source, `None` when it does not exist
pub async fn discover(
    db: &DatabaseConnection,
    data_source_type: DataSourceType,
    name: &str,
) -> Result<Option<Vec<Field>>, sea_orm::DbErr> {
    if data_source_type == DataSourceType::Function {
        return Ok(None);
    }
    if !source_exists(db, name).await? {
        return Ok(None);
    }
    Ok(Some(read_columns(db, name).await?))
}

/// Answer for `POST /api/reportbuilder/datasources/check`
pub async fn check(
    db: &DatabaseConnection,
    data_source_type: DataSourceType,
    name: &str,
) -> Result<CheckDataSourceResponse, sea_orm::DbErr> {
    let name = name.trim();
    if data_source_type == DataSourceType::Function {
        return Ok(CheckDataSourceResponse {
            exists: false,
            message: Some(FUNCTIONS_UNSUPPORTED.to_string()),
            schema: Vec::new(),
        });
    }
    match discover(db, data_source_type, name).await? {
        Some(schema) if !schema.is_empty() => Ok(CheckDataSourceResponse {
            exists: true,
            message: None,
            schema,
        }),
        Some(_) => Ok(CheckDataSourceResponse {
            exists: true,
            message: Some(format!("View \"{}\" has no columns", name)),
            schema: Vec::new(),
        }),
        None => Ok(CheckDataSourceResponse {
            exists: false,
            message: Some(format!("View \"{}\" was not found", name)),
            schema: Vec::new(),
        }),
    }
}
