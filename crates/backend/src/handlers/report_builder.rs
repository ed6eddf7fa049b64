use axum::Json;
use contracts::shared::report_builder::{
    CheckDataSourceRequest, CheckDataSourceResponse, ConnectionDto,
};

use crate::shared::error::ApiResult;
use crate::shared::report_builder::{connections, service};

/// GET /api/reportbuilder/connections
pub async fn list_connections() -> ApiResult<Json<Vec<ConnectionDto>>> {
    Ok(Json(connections::registry()?.list()))
}

/// POST /api/reportbuilder/datasources/check
pub async fn check_data_source(
    Json(request): Json<CheckDataSourceRequest>,
) -> ApiResult<Json<CheckDataSourceResponse>> {
    let db = connections::registry()?.get(&request.connection_key)?;
    let response = service::check_data_source(db, &request).await?;
    Ok(Json(response))
}
