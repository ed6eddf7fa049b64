//! Response normalization
//!
//! Servers may wrap lists as a bare array, `{data: [...]}` or `{data: {items: [...]}}`
//! and may send keys in camelCase or PascalCase. Everything here turns such raw JSON
//! into the canonical DTOs so the rest of the builder never sees the variants.

use serde_json::{Map, Value};

use super::dto::{CheckDataSourceResponse, ConnectionDto, DataSourceType, PreviewResponse, ReportDto};
use super::field::Field;

// ============================================================================
// Key lookup
// ============================================================================

/// Look up a key as written, then PascalCase, then ignoring case
fn lookup<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(v) = obj.get(key) {
        return Some(v);
    }
    let pascal = pascal_case(key);
    if let Some(v) = obj.get(&pascal) {
        return Some(v);
    }
    obj.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

fn pascal_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lookup_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match lookup(obj, key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lookup_bool(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    match lookup(obj, key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn lookup_i64(obj: &Map<String, Value>, key: &str) -> Option<i64> {
    match lookup(obj, key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Unwrap `[...]`, `{data: [...]}` or `{data: {items: [...]}}`
fn unwrap_list(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match lookup(obj, "data") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(Value::Object(data)) => match lookup(data, "items") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => &[],
            },
            _ => match lookup(obj, "items") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => &[],
            },
        },
        _ => &[],
    }
}

/// Unwrap a single entity optionally wrapped as `{data: {...}}`
fn unwrap_object(value: &Value) -> Option<&Map<String, Value>> {
    let obj = value.as_object()?;
    match lookup(obj, "data") {
        Some(Value::Object(inner)) => Some(inner),
        _ => Some(obj),
    }
}

// ============================================================================
// Endpoints
// ============================================================================

pub fn normalize_report(value: &Value) -> Option<ReportDto> {
    let obj = unwrap_object(value)?;
    let id = lookup_i64(obj, "id")?;
    if id <= 0 {
        return None;
    }
    Some(ReportDto {
        id,
        name: lookup_str(obj, "name").unwrap_or_default(),
        description: lookup_str(obj, "description"),
        connection_key: lookup_str(obj, "connectionKey").unwrap_or_default(),
        data_source_type: lookup_str(obj, "dataSourceType").and_then(|t| DataSourceType::parse(&t)),
        data_source_name: lookup_str(obj, "dataSourceName").unwrap_or_default(),
        config_json: lookup_str(obj, "configJson").unwrap_or_default(),
        created_at: lookup_str(obj, "createdAt"),
        updated_at: lookup_str(obj, "updatedAt"),
        is_deleted: lookup_bool(obj, "isDeleted"),
    })
}

/// Reports from any of the list shapes; malformed entries (`id <= 0`) are dropped
pub fn normalize_report_list(value: &Value) -> Vec<ReportDto> {
    unwrap_list(value)
        .iter()
        .filter_map(normalize_report)
        .collect()
}

pub fn normalize_field(value: &Value) -> Option<Field> {
    let obj = value.as_object()?;
    let name = lookup_str(obj, "name").filter(|n| !n.is_empty())?;
    Some(Field {
        name,
        sql_type: lookup_str(obj, "sqlType").unwrap_or_default(),
        dot_net_type: lookup_str(obj, "dotNetType").unwrap_or_default(),
        is_nullable: lookup_bool(obj, "isNullable").unwrap_or(false),
    })
}

/// `exists` is true if the server says so or a non-empty schema came back
pub fn normalize_check_response(value: &Value) -> CheckDataSourceResponse {
    let Some(obj) = unwrap_object(value) else {
        return CheckDataSourceResponse::default();
    };
    let schema: Vec<Field> = match lookup(obj, "schema") {
        Some(schema) => unwrap_list(schema).iter().filter_map(normalize_field).collect(),
        None => Vec::new(),
    };
    let exists = lookup_bool(obj, "exists").unwrap_or(false) || !schema.is_empty();
    CheckDataSourceResponse {
        exists,
        message: lookup_str(obj, "message"),
        schema,
    }
}

/// Columns become plain names whether sent as strings or `{name, ...}` objects
pub fn normalize_preview_response(value: &Value) -> PreviewResponse {
    let Some(obj) = unwrap_object(value) else {
        return PreviewResponse::default();
    };
    let columns = match lookup(obj, "columns") {
        Some(Value::Array(cols)) => cols
            .iter()
            .filter_map(|c| match c {
                Value::String(s) => Some(s.clone()),
                Value::Object(o) => lookup_str(o, "name"),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    let rows = match lookup(obj, "rows") {
        Some(Value::Array(rows)) => rows.clone(),
        _ => Vec::new(),
    };
    PreviewResponse { columns, rows }
}

pub fn normalize_connections(value: &Value) -> Vec<ConnectionDto> {
    unwrap_list(value)
        .iter()
        .filter_map(|c| match c {
            Value::String(key) => Some(ConnectionDto {
                key: key.clone(),
                label: None,
            }),
            Value::Object(o) => lookup_str(o, "key")
                .filter(|k| !k.is_empty())
                .map(|key| ConnectionDto {
                    key,
                    label: lookup_str(o, "label"),
                }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_list_shapes() {
        let entry = json!({"id": 3, "name": "Sales", "connectionKey": "erp",
            "dataSourceType": "view", "dataSourceName": "vw_sales", "configJson": "{}"});

        let bare = json!([entry.clone()]);
        let wrapped = json!({"data": [entry.clone()]});
        let paged = json!({"data": {"items": [entry.clone()], "total": 1}});

        for shape in [bare, wrapped, paged] {
            let list = normalize_report_list(&shape);
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].id, 3);
            assert_eq!(list[0].data_source_type, Some(DataSourceType::View));
        }
        assert!(normalize_report_list(&json!("oops")).is_empty());
    }

    #[test]
    fn test_malformed_reports_are_dropped() {
        let list = normalize_report_list(&json!([
            {"id": 0, "name": "zero"},
            {"name": "no id"},
            {"Id": "7", "Name": "Pascal", "DataSourceType": "Function"},
        ]));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, 7);
        assert_eq!(list[0].name, "Pascal");
        assert_eq!(list[0].data_source_type, Some(DataSourceType::Function));
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let report = normalize_report(&json!({"ID": 5, "CONFIGJSON": "{\"chartType\":\"bar\"}"}))
            .unwrap();
        assert_eq!(report.id, 5);
        assert_eq!(report.config_json, "{\"chartType\":\"bar\"}");
    }

    #[test]
    fn test_unknown_data_source_type_is_none() {
        let report = normalize_report(&json!({"id": 1, "dataSourceType": "procedure"})).unwrap();
        assert_eq!(report.data_source_type, None);
    }

    #[test]
    fn test_check_exists_falls_back_to_schema() {
        let response = normalize_check_response(&json!({
            "exists": false,
            "schema": [
                {"name": "region", "sqlType": "nvarchar", "dotNetType": "String", "isNullable": false},
                {"Name": "total", "SqlType": "decimal", "DotNetType": "Decimal", "IsNullable": true},
            ]
        }));
        assert!(response.exists);
        assert_eq!(response.schema.len(), 2);
        assert!(response.schema[1].is_nullable);

        let missing = normalize_check_response(&json!({"message": "not found"}));
        assert!(!missing.exists);
        assert_eq!(missing.message.as_deref(), Some("not found"));
    }

    #[test]
    fn test_preview_columns_are_names() {
        let preview = normalize_preview_response(&json!({
            "columns": ["region", {"name": "sum_total", "type": "decimal"}],
            "rows": [{"region": "EU", "sum_total": 10}]
        }));
        assert_eq!(preview.columns, vec!["region", "sum_total"]);
        assert_eq!(preview.rows.len(), 1);

        let no_rows = normalize_preview_response(&json!({"columns": []}));
        assert!(no_rows.rows.is_empty());
    }

    #[test]
    fn test_connections() {
        let list = normalize_connections(&json!({"data": [
            {"key": "erp", "label": "ERP"},
            "crm",
            {"label": "no key"},
        ]}));
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].key, "crm");
    }
}
