//! CSV download of tabular report data
use contracts::shared::report_builder::PreviewResponse;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use crate::shared::report_builder::chart_model::preview_to_csv;

/// Export preview rows as a semicolon separated CSV file
pub fn export_preview_csv(preview: &PreviewResponse, filename: &str) -> Result<(), String> {
    if preview.is_empty() {
        return Err("No rows to export".to_string());
    }
    let blob = create_csv_blob(&preview_to_csv(preview))?;
    download_blob(&blob, filename)
}

/// File name for a report export, e.g. `sales_by_region.csv`
pub fn csv_file_name(report_name: &str) -> String {
    let stem: String = report_name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "report.csv".to_string()
    } else {
        format!("{}.csv", stem)
    }
}

fn create_csv_blob(content: &str) -> Result<Blob, String> {
    let array = js_sys::Array::new();
    array.push(&wasm_bindgen::JsValue::from_str(content));

    let properties = BlobPropertyBag::new();
    properties.set_type("text/csv;charset=utf-8;");

    Blob::new_with_str_sequence_and_options(&array, &properties)
        .map_err(|e| format!("Failed to create blob: {:?}", e))
}

/// Trigger a browser download through a temporary anchor
fn download_blob(blob: &Blob, filename: &str) -> Result<(), String> {
    let window = web_sys::window().ok_or("No window object")?;
    let document = window.document().ok_or("No document object")?;
    let body = document.body().ok_or("No body element")?;

    let url = Url::create_object_url_with_blob(blob)
        .map_err(|e| format!("Failed to create object URL: {:?}", e))?;

    let anchor = document
        .create_element("a")
        .map_err(|e| format!("Failed to create anchor: {:?}", e))?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|e| format!("Failed to cast to anchor: {:?}", e))?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor
        .style()
        .set_property("display", "none")
        .map_err(|e| format!("Failed to set style: {:?}", e))?;

    body.append_child(&anchor)
        .map_err(|e| format!("Failed to append anchor: {:?}", e))?;
    anchor.click();
    body.remove_child(&anchor)
        .map_err(|e| format!("Failed to remove anchor: {:?}", e))?;

    Url::revoke_object_url(&url).map_err(|e| format!("Failed to revoke URL: {:?}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_file_name() {
        assert_eq!(csv_file_name("Sales by Region"), "sales_by_region.csv");
        assert_eq!(csv_file_name("  "), "report.csv");
        assert_eq!(csv_file_name("Q1/2024"), "q1_2024.csv");
    }
}
