use contracts::shared::report_builder::{
    CheckDataSourceRequest, CheckDataSourceResponse, DataSourceType, PreviewRequest,
    PreviewResponse, ReportConfig,
};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, QueryResult as DbRow, Statement};
use serde_json::{Map, Value};

use super::introspect;
use super::query_builder::{QueryBuilder, QueryParam};
use crate::shared::error::{ApiError, ApiResult};

/// Check a data source on an already resolved connection
pub async fn check_data_source(
    db: &DatabaseConnection,
    request: &CheckDataSourceRequest,
) -> ApiResult<CheckDataSourceResponse> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Data source name is required".into()));
    }
    let response = introspect::check(db, request.data_source_type, name).await?;
    tracing::info!(
        "Checked {} \"{}\" on {}: exists={}, {} fields",
        request.data_source_type.as_str(),
        name,
        request.connection_key,
        response.exists,
        response.schema.len()
    );
    Ok(response)
}

/// Run the preview query for a report config
pub async fn preview(
    db: &DatabaseConnection,
    request: &PreviewRequest,
) -> ApiResult<PreviewResponse> {
    let name = request.data_source_name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Data source name is required".into()));
    }
    if request.data_source_type == DataSourceType::Function {
        return Err(ApiError::Validation(introspect::FUNCTIONS_UNSUPPORTED.into()));
    }
    let config = ReportConfig::from_config_json(&request.config_json)
        .map_err(|e| ApiError::Validation(format!("Invalid configJson: {}", e)))?;

    let schema = introspect::discover(db, request.data_source_type, name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("View \"{}\" was not found", name)))?;

    let query = QueryBuilder::new(name, &schema, &config)
        .build()
        .map_err(ApiError::Query)?;
    tracing::debug!("Preview SQL: {}", query.sql);

    let stmt = build_statement(&query.sql, &query.params);
    let results = db
        .query_all(stmt)
        .await
        .map_err(|e| ApiError::Query(e.to_string()))?;

    let rows = results
        .iter()
        .map(|row| row_to_json(row, &query.columns))
        .collect();

    Ok(PreviewResponse {
        columns: query.columns,
        rows,
    })
}

/// Build a Statement with parameters
fn build_statement(sql: &str, params: &[QueryParam]) -> Statement {
    let values: Vec<sea_orm::Value> = params
        .iter()
        .map(|p| match p {
            QueryParam::Text(s) => s.clone().into(),
            QueryParam::Integer(i) => (*i).into(),
            QueryParam::Numeric(n) => (*n).into(),
        })
        .collect();

    Statement::from_sql_and_values(DatabaseBackend::Sqlite, sql, values)
}

fn row_to_json(row: &DbRow, columns: &[String]) -> Value {
    let mut object = Map::with_capacity(columns.len());
    for column in columns {
        object.insert(column.clone(), cell_value(row, column));
    }
    Value::Object(object)
}

/// SQLite cells are dynamically typed: try integer, then real, then text
fn cell_value(row: &DbRow, column: &str) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>>("", column) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>>("", column) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>>("", column) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::report_builder::introspect::tests::sales_db;
    use contracts::shared::report_builder::{
        AxisSlot, DateGrouping, FilterOperator, FilterPatch, Slot,
    };

    fn request(config: &ReportConfig) -> PreviewRequest {
        PreviewRequest {
            connection_key: "app".into(),
            data_source_type: DataSourceType::View,
            data_source_name: "vw_sales".into(),
            config_json: config.to_config_json(),
        }
    }

    fn number(value: &Value) -> f64 {
        value.as_f64().unwrap()
    }

    #[tokio::test]
    async fn test_preview_sum_by_region() {
        let db = sales_db().await;
        let mut config = ReportConfig::default();
        config.add_to_slot(Slot::Axis, "region", None);
        config.add_to_slot(Slot::Values, "total", None);

        let response = preview(&db, &request(&config)).await.unwrap();
        assert_eq!(response.columns, vec!["region", "sum_total"]);
        let regions: Vec<&str> = response
            .rows
            .iter()
            .map(|r| r["region"].as_str().unwrap())
            .collect();
        assert_eq!(regions, vec!["East", "North", "South"]);
        assert_eq!(number(&response.rows[0]["sum_total"]), 75.25);
        assert_eq!(number(&response.rows[1]["sum_total"]), 150.5);
        assert_eq!(number(&response.rows[2]["sum_total"]), 200.0);
    }

    #[tokio::test]
    async fn test_preview_month_grouping_with_filter() {
        let db = sales_db().await;
        let mut config = ReportConfig {
            axis: Some(AxisSlot {
                field: "order_date".into(),
                date_grouping: Some(DateGrouping::Month),
            }),
            ..Default::default()
        };
        config.add_to_slot(Slot::Values, "qty", None);
        config.add_to_slot(Slot::Filters, "channel", None);
        config.update_filter(0, FilterPatch::operator(FilterOperator::IsNotNull));

        let response = preview(&db, &request(&config)).await.unwrap();
        assert_eq!(response.rows.len(), 2);
        assert_eq!(response.rows[0]["order_date"], "2024-01");
        assert_eq!(response.rows[0]["sum_qty"], 3);
        assert_eq!(response.rows[1]["order_date"], "2024-02");
        assert_eq!(response.rows[1]["sum_qty"], 3);
    }

    #[tokio::test]
    async fn test_preview_raw_rows_keep_nulls() {
        let db = sales_db().await;
        let mut config = ReportConfig::default();
        config.add_to_slot(Slot::Filters, "region", None);
        config.update_filter(0, FilterPatch::value(Some("East".into())));

        let response = preview(&db, &request(&config)).await.unwrap();
        assert_eq!(response.columns.len(), 5);
        assert_eq!(response.rows.len(), 1);
        let row = &response.rows[0];
        assert_eq!(row["region"], "East");
        assert!(row["channel"].is_null());
        assert!(row["qty"].is_null());
        assert_eq!(number(&row["total"]), 75.25);
    }

    #[tokio::test]
    async fn test_preview_errors() {
        let db = sales_db().await;
        let mut missing = request(&ReportConfig::default());
        missing.data_source_name = "vw_missing".into();
        assert!(matches!(
            preview(&db, &missing).await.unwrap_err(),
            ApiError::NotFound(_)
        ));

        let mut corrupt = request(&ReportConfig::default());
        corrupt.config_json = "[1, 2".into();
        assert!(matches!(
            preview(&db, &corrupt).await.unwrap_err(),
            ApiError::Validation(_)
        ));

        let mut config = ReportConfig::default();
        config.add_to_slot(Slot::Axis, "price", None);
        assert!(matches!(
            preview(&db, &request(&config)).await.unwrap_err(),
            ApiError::Query(ref m) if m == "Field not found: price"
        ));
    }

    #[tokio::test]
    async fn test_check_requires_a_name() {
        let db = sales_db().await;
        let request = CheckDataSourceRequest {
            connection_key: "app".into(),
            data_source_type: DataSourceType::View,
            name: "  ".into(),
        };
        assert!(matches!(
            check_data_source(&db, &request).await.unwrap_err(),
            ApiError::Validation(_)
        ));
    }
}
