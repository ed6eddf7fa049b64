//! API client for the report builder
//!
//! Data-source discovery, preview execution and report persistence. Every
//! response goes through the normalization boundary in `contracts` before it
//! reaches the store.

use async_trait::async_trait;
use contracts::shared::report_builder::normalize::{
    normalize_check_response, normalize_connections, normalize_preview_response,
    normalize_report, normalize_report_list,
};
use contracts::shared::report_builder::{
    CheckDataSourceRequest, CheckDataSourceResponse, ConnectionDto, PreviewRequest,
    PreviewResponse, ReportDto, SaveReportRequest,
};
use gloo_net::http::{Request, Response};
use serde_json::Value;

use crate::shared::api_utils::api_url;

/// Message used when the transport gives nothing better
pub const REQUEST_FAILED: &str = "Request failed";

/// Remote operations the builder depends on
#[async_trait(?Send)]
pub trait ReportBuilderApi {
    async fn list_connections(&self) -> Result<Vec<ConnectionDto>, String>;

    async fn check_data_source(
        &self,
        request: &CheckDataSourceRequest,
    ) -> Result<CheckDataSourceResponse, String>;

    async fn preview(&self, request: &PreviewRequest) -> Result<PreviewResponse, String>;

    async fn list_reports(&self, search: Option<&str>) -> Result<Vec<ReportDto>, String>;

    async fn get_report(&self, id: i64) -> Result<ReportDto, String>;

    async fn create_report(&self, body: &SaveReportRequest) -> Result<ReportDto, String>;

    async fn update_report(&self, id: i64, body: &SaveReportRequest) -> Result<ReportDto, String>;

    async fn delete_report(&self, id: i64) -> Result<(), String>;
}

/// `ReportBuilderApi` over HTTP against the backend on port 3000
#[derive(Clone, Copy, Default)]
pub struct HttpReportApi;

// ============================================================================
// Response helpers
// ============================================================================

/// Turn a non-2xx response into the server's `message`, or a generic text
async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("Message"))
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
        })
        .filter(|m| !m.trim().is_empty());

    match message {
        Some(m) => m,
        None if !text.trim().is_empty() && text.len() < 300 => text,
        None if status > 0 => format!("{} (HTTP {})", REQUEST_FAILED, status),
        None => REQUEST_FAILED.to_string(),
    }
}

async fn read_json(response: Response) -> Result<Value, String> {
    if !response.ok() {
        return Err(error_message(response).await);
    }
    response.json::<Value>().await.map_err(|e| e.to_string())
}

fn transport_error(e: gloo_net::Error) -> String {
    let message = e.to_string();
    if message.trim().is_empty() {
        REQUEST_FAILED.to_string()
    } else {
        message
    }
}

async fn get_json(url: &str) -> Result<Value, String> {
    let response = Request::get(url).send().await.map_err(transport_error)?;
    read_json(response).await
}

async fn send_json<B: serde::Serialize>(
    builder: gloo_net::http::RequestBuilder,
    body: &B,
) -> Result<Value, String> {
    let response = builder
        .json(body)
        .map_err(transport_error)?
        .send()
        .await
        .map_err(transport_error)?;
    read_json(response).await
}

fn report_or_error(value: &Value) -> Result<ReportDto, String> {
    normalize_report(value).ok_or_else(|| "Server returned an invalid report".to_string())
}

// ============================================================================
// HTTP implementation
// ============================================================================

#[async_trait(?Send)]
impl ReportBuilderApi for HttpReportApi {
    async fn list_connections(&self) -> Result<Vec<ConnectionDto>, String> {
        let value = get_json(&api_url("/api/reportbuilder/connections")).await?;
        Ok(normalize_connections(&value))
    }

    async fn check_data_source(
        &self,
        request: &CheckDataSourceRequest,
    ) -> Result<CheckDataSourceResponse, String> {
        let url = api_url("/api/reportbuilder/datasources/check");
        let value = send_json(Request::post(&url), request).await?;
        Ok(normalize_check_response(&value))
    }

    async fn preview(&self, request: &PreviewRequest) -> Result<PreviewResponse, String> {
        let url = api_url("/api/reports/preview");
        let value = send_json(Request::post(&url), request).await?;
        Ok(normalize_preview_response(&value))
    }

    async fn list_reports(&self, search: Option<&str>) -> Result<Vec<ReportDto>, String> {
        let mut url = api_url("/api/reports");
        if let Some(q) = search.map(str::trim).filter(|q| !q.is_empty()) {
            url.push_str(&format!("?search={}", urlencoding::encode(q)));
        }
        let value = get_json(&url).await?;
        Ok(normalize_report_list(&value))
    }

    async fn get_report(&self, id: i64) -> Result<ReportDto, String> {
        let value = get_json(&api_url(&format!("/api/reports/{}", id))).await?;
        report_or_error(&value)
    }

    async fn create_report(&self, body: &SaveReportRequest) -> Result<ReportDto, String> {
        let url = api_url("/api/reports");
        let value = send_json(Request::post(&url), body).await?;
        report_or_error(&value)
    }

    async fn update_report(&self, id: i64, body: &SaveReportRequest) -> Result<ReportDto, String> {
        let url = api_url(&format!("/api/reports/{}", id));
        let value = send_json(Request::put(&url), body).await?;
        report_or_error(&value)
    }

    async fn delete_report(&self, id: i64) -> Result<(), String> {
        let url = api_url(&format!("/api/reports/{}", id));
        let response = Request::delete(&url).send().await.map_err(transport_error)?;
        if response.ok() {
            Ok(())
        } else {
            Err(error_message(response).await)
        }
    }
}
