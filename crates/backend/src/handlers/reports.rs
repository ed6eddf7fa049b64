use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use contracts::shared::report_builder::{
    PreviewRequest, PreviewResponse, ReportDto, SaveReportRequest,
};
use serde::Deserialize;

use crate::shared::data::db::get_connection;
use crate::shared::error::ApiResult;
use crate::shared::report_builder::{connections, repository, service};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

/// GET /api/reports?search=
pub async fn list(Query(query): Query<ListQuery>) -> ApiResult<Json<Vec<ReportDto>>> {
    let reports = repository::list(get_connection(), query.search.as_deref()).await?;
    Ok(Json(reports))
}

/// GET /api/reports/:id
pub async fn get_by_id(Path(id): Path<i64>) -> ApiResult<Json<ReportDto>> {
    Ok(Json(repository::get(get_connection(), id).await?))
}

/// POST /api/reports
pub async fn create(Json(request): Json<SaveReportRequest>) -> ApiResult<Json<ReportDto>> {
    Ok(Json(repository::create(get_connection(), &request).await?))
}

/// PUT /api/reports/:id
pub async fn update(
    Path(id): Path<i64>,
    Json(request): Json<SaveReportRequest>,
) -> ApiResult<Json<ReportDto>> {
    Ok(Json(repository::update(get_connection(), id, &request).await?))
}

/// DELETE /api/reports/:id
pub async fn delete(Path(id): Path<i64>) -> ApiResult<StatusCode> {
    repository::delete(get_connection(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/reports/preview
pub async fn preview(Json(request): Json<PreviewRequest>) -> ApiResult<Json<PreviewResponse>> {
    let db = connections::registry()?.get(&request.connection_key)?;
    Ok(Json(service::preview(db, &request).await?))
}
