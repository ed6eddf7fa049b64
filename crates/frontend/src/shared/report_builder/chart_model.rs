//! Pure transforms from a preview result to drawable geometry
//!
//! Everything here is independent of the DOM; the chart components only turn
//! these shapes into SVG elements.

use contracts::shared::report_builder::{PreviewResponse, ReportConfig, ValueSlot};
use serde_json::Value;

pub const CHART_WIDTH: f64 = 640.0;
pub const CHART_HEIGHT: f64 = 360.0;
pub const CHART_PADDING: f64 = 44.0;

const PALETTE: [&str; 8] = [
    "#0f6cbd", "#e3008c", "#13a10e", "#ca5010", "#8764b8", "#038387", "#c19c00", "#4f6bed",
];

pub fn series_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

// ============================================================================
// Cell values
// ============================================================================

/// Numeric reading of a cell; numeric strings count as numbers
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Format an integer with thousand separators
fn format_integer(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let mut result = String::new();
    let len = s.len();

    for (i, ch) in s.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(' ');
        }
        result.push(ch);
    }

    if n < 0 {
        format!("-{}", result)
    } else {
        result
    }
}

/// Thousand separators; two decimals only when the number has a fraction
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let rounded = (n * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        return format_integer(rounded as i64);
    }
    let abs = rounded.abs();
    let integer = abs.trunc() as i64;
    let cents = ((abs - abs.trunc()) * 100.0).round() as i64;
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, format_integer(integer), cents)
}

/// Table cell text and whether it is right-aligned as a number; text cells stay verbatim
pub fn table_cell(value: &Value) -> (String, bool) {
    (cell_text(value), matches!(value, Value::Number(_)))
}

/// Display text of a cell
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(_) => parse_number(value).map(format_number).unwrap_or_default(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Raw text of a cell, used for categories and CSV
fn raw_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ============================================================================
// Series
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Categories on the x axis and one or more series over them
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartData {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() || self.series.is_empty()
    }

    /// Smallest and largest plotted value, always spanning zero
    pub fn value_range(&self) -> (f64, f64) {
        let values = self.series.iter().flat_map(|s| s.values.iter().flatten());
        let (min, max) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if min == max {
            (min, min + 1.0)
        } else {
            (min, max)
        }
    }
}

/// Column a value slot comes back as
fn value_column(preview: &PreviewResponse, value: &ValueSlot) -> Option<String> {
    let alias = value.column_alias();
    if preview.columns.contains(&alias) {
        return Some(alias);
    }
    preview
        .columns
        .iter()
        .find(|c| **c == value.field)
        .cloned()
}

/// Column used for categories: the axis, else the legend, else the first column
fn category_column(preview: &PreviewResponse, config: &ReportConfig) -> Option<String> {
    config
        .axis
        .as_ref()
        .map(|a| a.field.clone())
        .or_else(|| config.legend.as_ref().map(|l| l.field.clone()))
        .filter(|c| preview.columns.contains(c))
        .or_else(|| preview.columns.first().cloned())
}

fn value_columns(preview: &PreviewResponse, config: &ReportConfig, category: &str) -> Vec<(String, String)> {
    let configured: Vec<(String, String)> = config
        .values
        .iter()
        .filter_map(|v| {
            value_column(preview, v).map(|col| {
                let label = format!("{}({})", v.aggregation.as_str(), v.field);
                (col, label)
            })
        })
        .collect();
    if !configured.is_empty() {
        return configured;
    }
    // No configured values: plot every numeric column
    preview
        .columns
        .iter()
        .filter(|c| c.as_str() != category)
        .filter(|c| {
            preview
                .rows
                .iter()
                .any(|row| row.get(c.as_str()).and_then(parse_number).is_some())
        })
        .map(|c| (c.clone(), c.clone()))
        .collect()
}

/// Categories plus series; with both axis and legend the first value column is pivoted by legend
pub fn build_chart_data(preview: &PreviewResponse, config: &ReportConfig) -> ChartData {
    let Some(category) = category_column(preview, config) else {
        return ChartData::default();
    };
    let values = value_columns(preview, config, &category);
    let Some((first_value, _)) = values.first().cloned() else {
        return ChartData::default();
    };

    let mut categories: Vec<String> = Vec::new();
    for row in &preview.rows {
        let c = raw_text(row.get(&category));
        if !categories.contains(&c) {
            categories.push(c);
        }
    }

    let legend = config
        .axis
        .as_ref()
        .and(config.legend.as_ref())
        .map(|l| l.field.clone())
        .filter(|l| preview.columns.contains(l) && *l != category);

    let series = match legend {
        Some(legend) => {
            let mut series: Vec<Series> = Vec::new();
            for row in &preview.rows {
                let name = raw_text(row.get(&legend));
                let index = match series.iter().position(|s| s.name == name) {
                    Some(i) => i,
                    None => {
                        series.push(Series {
                            name,
                            values: vec![None; categories.len()],
                        });
                        series.len() - 1
                    }
                };
                let c = raw_text(row.get(&category));
                if let Some(ci) = categories.iter().position(|x| *x == c) {
                    let v = row.get(&first_value).and_then(parse_number);
                    let slot = &mut series[index].values[ci];
                    *slot = match (*slot, v) {
                        (Some(a), Some(b)) => Some(a + b),
                        (a, b) => a.or(b),
                    };
                }
            }
            series
        }
        None => values
            .iter()
            .map(|(column, label)| Series {
                name: label.clone(),
                values: categories
                    .iter()
                    .map(|c| {
                        preview
                            .rows
                            .iter()
                            .find(|row| raw_text(row.get(&category)) == *c)
                            .and_then(|row| row.get(column))
                            .and_then(parse_number)
                    })
                    .collect(),
            })
            .collect(),
    };

    ChartData { categories, series }
}

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BarRect {
    pub series: usize,
    pub category: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub value: f64,
}

/// Vertical y coordinate of a value within the plot area
fn scale_y(value: f64, (min, max): (f64, f64), height: f64, padding: f64) -> f64 {
    let plot = height - 2.0 * padding;
    height - padding - (value - min) / (max - min) * plot
}

/// Grouped bars: one group per category, one bar per series
pub fn bar_layout(data: &ChartData, width: f64, height: f64, padding: f64) -> Vec<BarRect> {
    if data.is_empty() {
        return Vec::new();
    }
    let range = data.value_range();
    let group_width = (width - 2.0 * padding) / data.categories.len() as f64;
    let bar_width = group_width * 0.8 / data.series.len() as f64;
    let zero = scale_y(0.0, range, height, padding);

    let mut bars = Vec::new();
    for (ci, _) in data.categories.iter().enumerate() {
        for (si, series) in data.series.iter().enumerate() {
            let Some(value) = series.values.get(ci).copied().flatten() else {
                continue;
            };
            let top = scale_y(value, range, height, padding);
            bars.push(BarRect {
                series: si,
                category: ci,
                x: padding + ci as f64 * group_width + group_width * 0.1 + si as f64 * bar_width,
                y: top.min(zero),
                width: bar_width,
                height: (zero - top).abs(),
                value,
            });
        }
    }
    bars
}

/// X coordinate of a category centre
pub fn category_x(index: usize, count: usize, width: f64, padding: f64) -> f64 {
    let step = (width - 2.0 * padding) / count.max(1) as f64;
    padding + step * (index as f64 + 0.5)
}

/// One SVG path per series; gaps split the line
pub fn line_paths(data: &ChartData, width: f64, height: f64, padding: f64) -> Vec<String> {
    if data.is_empty() {
        return Vec::new();
    }
    let range = data.value_range();
    data.series
        .iter()
        .map(|series| {
            let mut d = String::new();
            let mut pen_down = false;
            for (ci, value) in series.values.iter().enumerate() {
                match value {
                    Some(v) => {
                        let x = category_x(ci, data.categories.len(), width, padding);
                        let y = scale_y(*v, range, height, padding);
                        let cmd = if pen_down { 'L' } else { 'M' };
                        if !d.is_empty() {
                            d.push(' ');
                        }
                        d.push_str(&format!("{}{:.2},{:.2}", cmd, x, y));
                        pen_down = true;
                    }
                    None => pen_down = false,
                }
            }
            d
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl PieSlice {
    pub fn percent(&self) -> f64 {
        (self.end_angle - self.start_angle) / 360.0 * 100.0
    }
}

/// Slices of the first series; non-positive values are skipped
pub fn pie_slices(data: &ChartData) -> Vec<PieSlice> {
    let Some(series) = data.series.first() else {
        return Vec::new();
    };
    let entries: Vec<(String, f64)> = data
        .categories
        .iter()
        .zip(series.values.iter())
        .filter_map(|(label, v)| v.filter(|v| *v > 0.0).map(|v| (label.clone(), v)))
        .collect();
    let total: f64 = entries.iter().map(|(_, v)| v).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut angle = 0.0;
    let count = entries.len();
    entries
        .into_iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let start = angle;
            // Last slice closes the circle exactly
            let end = if i + 1 == count { 360.0 } else { angle + value / total * 360.0 };
            angle = end;
            PieSlice {
                label,
                value,
                start_angle: start,
                end_angle: end,
            }
        })
        .collect()
}

fn polar(cx: f64, cy: f64, r: f64, angle_deg: f64) -> (f64, f64) {
    let rad = (angle_deg - 90.0).to_radians();
    (cx + r * rad.cos(), cy + r * rad.sin())
}

/// SVG path of a pie slice; a full circle is drawn as two arcs
pub fn arc_path(cx: f64, cy: f64, r: f64, start: f64, end: f64) -> String {
    if end - start >= 359.999 {
        return format!(
            "M{:.2},{:.2} m{:.2},0 a{r:.2},{r:.2} 0 1,0 {:.2},0 a{r:.2},{r:.2} 0 1,0 {:.2},0",
            cx,
            cy,
            -r,
            2.0 * r,
            -2.0 * r,
            r = r
        );
    }
    let (x1, y1) = polar(cx, cy, r, start);
    let (x2, y2) = polar(cx, cy, r, end);
    let large = if end - start > 180.0 { 1 } else { 0 };
    format!(
        "M{:.2},{:.2} L{:.2},{:.2} A{:.2},{:.2} 0 {},1 {:.2},{:.2} Z",
        cx, cy, x1, y1, r, r, large, x2, y2
    )
}

// ============================================================================
// CSV
// ============================================================================

/// Escape CSV field (add quotes if needed) - semicolon separator
fn escape_csv_field(field: &str) -> String {
    if field.contains(';') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// CSV of the preview, with UTF-8 BOM for Excel
pub fn preview_to_csv(preview: &PreviewResponse) -> String {
    let mut csv = String::from("\u{FEFF}");
    let headers: Vec<String> = preview.columns.iter().map(|c| escape_csv_field(c)).collect();
    csv.push_str(&headers.join(";"));
    csv.push('\n');

    for row in &preview.rows {
        let cells: Vec<String> = preview
            .columns
            .iter()
            .map(|c| escape_csv_field(&raw_text(row.get(c))))
            .collect();
        csv.push_str(&cells.join(";"));
        csv.push('\n');
    }
    csv
}
