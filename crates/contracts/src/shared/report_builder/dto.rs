use serde::{Deserialize, Serialize};

use super::config::ReportConfig;
use super::field::Field;

/// Kind of data source a report reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceType {
    #[default]
    #[serde(alias = "View")]
    View,
    #[serde(alias = "Function")]
    Function,
}

impl DataSourceType {
    pub const ALL: [DataSourceType; 2] = [DataSourceType::View, DataSourceType::Function];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceType::View => "view",
            DataSourceType::Function => "function",
        }
    }

    /// Case-insensitive parse; unknown values give `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "view" => Some(DataSourceType::View),
            "function" => Some(DataSourceType::Function),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DataSourceType::View => "View",
            DataSourceType::Function => "Function",
        }
    }
}

/// A named backend data connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ConnectionDto {
    /// Label when present, key otherwise
    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckDataSourceRequest {
    pub connection_key: String,
    #[serde(rename = "type")]
    pub data_source_type: DataSourceType,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckDataSourceResponse {
    #[serde(default)]
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub schema: Vec<Field>,
}

/// Persisted report: metadata plus the serialized `ReportConfig`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDto {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub connection_key: String,
    /// `None` when the stored value is not a known data-source type
    #[serde(default)]
    pub data_source_type: Option<DataSourceType>,
    pub data_source_name: String,
    #[serde(default)]
    pub config_json: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl ReportDto {
    /// Hydrate the stored configuration
    pub fn config(&self) -> Result<ReportConfig, serde_json::Error> {
        ReportConfig::from_config_json(&self.config_json)
    }
}

/// Body of `POST /api/reports` and `PUT /api/reports/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReportRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub connection_key: String,
    pub data_source_type: DataSourceType,
    pub data_source_name: String,
    pub config_json: String,
}

/// Body of `POST /api/reports/preview`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub connection_key: String,
    pub data_source_type: DataSourceType,
    pub data_source_name: String,
    pub config_json: String,
}

/// Tabular preview result; rows are JSON objects keyed by column name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreviewResponse {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,
}

impl PreviewResponse {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Error body returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_request_wire_shape() {
        let request = CheckDataSourceRequest {
            connection_key: "erp".into(),
            data_source_type: DataSourceType::View,
            name: "vw_sales".into(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"connectionKey": "erp", "type": "view", "name": "vw_sales"})
        );
    }

    #[test]
    fn test_data_source_type_parse() {
        assert_eq!(DataSourceType::parse(" View "), Some(DataSourceType::View));
        assert_eq!(DataSourceType::parse("FUNCTION"), Some(DataSourceType::Function));
        assert_eq!(DataSourceType::parse("table"), None);
    }

    #[test]
    fn test_connection_display_name() {
        let bare = ConnectionDto { key: "erp".into(), label: None };
        assert_eq!(bare.display_name(), "erp");
        let labelled = ConnectionDto { key: "erp".into(), label: Some("ERP".into()) };
        assert_eq!(labelled.display_name(), "ERP");
    }
}
