use serde::{Deserialize, Serialize};

use super::field::{Field, FilterOperator};

/// Visualization the report renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Table,
    Bar,
    Line,
    Pie,
}

impl ChartType {
    pub const ALL: [ChartType; 4] = [
        ChartType::Table,
        ChartType::Bar,
        ChartType::Line,
        ChartType::Pie,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Table => "table",
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartType::Table => "Table",
            ChartType::Bar => "Bar",
            ChartType::Line => "Line",
            ChartType::Pie => "Pie",
        }
    }
}

/// Bucket size applied to a date-like axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateGrouping {
    Day,
    Week,
    Month,
    Year,
}

impl DateGrouping {
    pub const ALL: [DateGrouping; 4] = [
        DateGrouping::Day,
        DateGrouping::Week,
        DateGrouping::Month,
        DateGrouping::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateGrouping::Day => "day",
            DateGrouping::Week => "week",
            DateGrouping::Month => "month",
            DateGrouping::Year => "year",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == value)
    }
}

/// Numeric reduction applied to a value field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Count,
    Avg,
    Min,
    Max,
}

impl Aggregation {
    pub const ALL: [Aggregation; 5] = [
        Aggregation::Sum,
        Aggregation::Count,
        Aggregation::Avg,
        Aggregation::Min,
        Aggregation::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Count => "count",
            Aggregation::Avg => "avg",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == value)
    }

    /// Get SQL function name
    pub fn to_sql(&self) -> &'static str {
        match self {
            Aggregation::Sum => "SUM",
            Aggregation::Count => "COUNT",
            Aggregation::Avg => "AVG",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisSlot {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_grouping: Option<DateGrouping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSlot {
    pub field: String,
    #[serde(default)]
    pub aggregation: Aggregation,
}

impl ValueSlot {
    /// Column name the preview query returns for this value
    pub fn column_alias(&self) -> String {
        format!("{}_{}", self.aggregation.as_str(), self.field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendSlot {
    pub field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Axis,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sorting {
    pub by: SortBy,
    #[serde(default)]
    pub direction: SortDirection,
    /// Value field to sort by when `by` is `value` (first value when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,
}

/// A filter on one field; which operands are used depends on the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSlot {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl FilterSlot {
    /// New filter with the default `eq` operator and no operands
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            operator: FilterOperator::Eq,
            value: None,
            values: None,
            from: None,
            to: None,
        }
    }
}

/// Partial update for a filter; `None` leaves the attribute untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub operator: Option<FilterOperator>,
    pub value: Option<Option<String>>,
    pub values: Option<Option<Vec<String>>>,
    pub from: Option<Option<String>>,
    pub to: Option<Option<String>>,
}

impl FilterPatch {
    pub fn operator(operator: FilterOperator) -> Self {
        Self {
            operator: Some(operator),
            ..Default::default()
        }
    }

    pub fn value(value: Option<String>) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn values(values: Option<Vec<String>>) -> Self {
        Self {
            values: Some(values),
            ..Default::default()
        }
    }

    pub fn range(from: Option<String>, to: Option<String>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        }
    }

    fn apply(self, filter: &mut FilterSlot) {
        if let Some(operator) = self.operator {
            filter.operator = operator;
        }
        if let Some(value) = self.value {
            filter.value = value;
        }
        if let Some(values) = self.values {
            filter.values = values;
        }
        if let Some(from) = self.from {
            filter.from = from;
        }
        if let Some(to) = self.to {
            filter.to = to;
        }
    }
}

/// One of the four drop targets of the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Axis,
    Values,
    Legend,
    Filters,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Axis, Slot::Values, Slot::Legend, Slot::Filters];

    /// Identity of the drop target element for this slot
    pub fn drop_id(&self) -> &'static str {
        match self {
            Slot::Axis => "slot-axis",
            Slot::Values => "slot-values",
            Slot::Legend => "slot-legend",
            Slot::Filters => "slot-filters",
        }
    }

    pub fn from_drop_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.drop_id() == id)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Slot::Axis => "Axis",
            Slot::Values => "Values",
            Slot::Legend => "Legend",
            Slot::Filters => "Filters",
        }
    }

    /// Field-type compatibility of this slot; filters take any field
    pub fn accepts(&self, field: &Field) -> bool {
        match self {
            Slot::Axis => field.is_axis_compatible(),
            Slot::Values => field.is_values_compatible(),
            Slot::Legend => field.is_legend_compatible(),
            Slot::Filters => true,
        }
    }

    /// Message shown when a drop is rejected
    pub fn rejection_message(&self, field: &Field) -> String {
        match self {
            Slot::Axis => format!("\"{}\" cannot be used as axis: text or date field required", field.name),
            Slot::Values => format!("\"{}\" cannot be used as value: numeric field required", field.name),
            Slot::Legend => format!("\"{}\" cannot be used as legend: text field required", field.name),
            Slot::Filters => String::new(),
        }
    }
}

/// Item of a list slot addressed either by position or by field name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotItem<'a> {
    Index(usize),
    Field(&'a str),
}

/// Visual/analytical definition of a report
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    pub chart_type: ChartType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<AxisSlot>,
    pub values: Vec<ValueSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<LegendSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorting: Option<Sorting>,
    pub filters: Vec<FilterSlot>,
}

impl ReportConfig {
    // ========================================================================
    // Serialization
    // ========================================================================

    /// Dehydrate to the `configJson` blob stored on the report
    pub fn to_config_json(&self) -> String {
        // Only plain enums, strings and vectors: serialization cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Hydrate from `configJson`; missing attributes take their defaults
    pub fn from_config_json(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Replace chart type; other slots are kept
    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        self.chart_type = chart_type;
    }

    /// Assign a field to a slot. Axis and legend are replaced, values and filters appended
    pub fn add_to_slot(&mut self, slot: Slot, field: &str, aggregation: Option<Aggregation>) {
        match slot {
            Slot::Axis => {
                self.axis = Some(AxisSlot {
                    field: field.to_string(),
                    date_grouping: None,
                })
            }
            Slot::Legend => {
                self.legend = Some(LegendSlot {
                    field: field.to_string(),
                })
            }
            Slot::Values => self.values.push(ValueSlot {
                field: field.to_string(),
                aggregation: aggregation.unwrap_or_default(),
            }),
            Slot::Filters => self.filters.push(FilterSlot::new(field)),
        }
    }

    /// Remove from a slot. Axis and legend are cleared whatever the item is
    pub fn remove_from_slot(&mut self, slot: Slot, item: SlotItem<'_>) {
        match slot {
            Slot::Axis => self.axis = None,
            Slot::Legend => self.legend = None,
            Slot::Values => {
                if let Some(index) = resolve_index(&self.values, item, |v| &v.field) {
                    self.values.remove(index);
                }
            }
            Slot::Filters => {
                if let Some(index) = resolve_index(&self.filters, item, |f| &f.field) {
                    self.filters.remove(index);
                }
            }
        }
    }

    /// Move an entry inside values or filters. Returns false when nothing moved
    pub fn reorder_slot(&mut self, slot: Slot, from: usize, to: usize) -> bool {
        match slot {
            Slot::Values => move_item(&mut self.values, from, to),
            Slot::Filters => move_item(&mut self.filters, from, to),
            Slot::Axis | Slot::Legend => false,
        }
    }

    pub fn set_aggregation(&mut self, index: usize, aggregation: Aggregation) {
        if let Some(value) = self.values.get_mut(index) {
            value.aggregation = aggregation;
        }
    }

    /// Set or clear the date bucket of the axis; no-op without an axis
    pub fn set_date_grouping(&mut self, grouping: Option<DateGrouping>) {
        if let Some(axis) = self.axis.as_mut() {
            axis.date_grouping = grouping;
        }
    }

    pub fn set_sorting(&mut self, sorting: Option<Sorting>) {
        self.sorting = sorting;
    }

    pub fn add_filter(&mut self, filter: FilterSlot) {
        self.filters.push(filter);
    }

    pub fn update_filter(&mut self, index: usize, patch: FilterPatch) {
        if let Some(filter) = self.filters.get_mut(index) {
            patch.apply(filter);
        }
    }

    pub fn remove_filter(&mut self, index: usize) {
        if index < self.filters.len() {
            self.filters.remove(index);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// True when any of axis, values, legend or filters holds something
    pub fn has_assignments(&self) -> bool {
        self.axis.is_some()
            || self.legend.is_some()
            || !self.values.is_empty()
            || !self.filters.is_empty()
    }

    /// Names of every field referenced by the config, in slot order
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        if let Some(axis) = &self.axis {
            fields.push(axis.field.as_str());
        }
        fields.extend(self.values.iter().map(|v| v.field.as_str()));
        if let Some(legend) = &self.legend {
            fields.push(legend.field.as_str());
        }
        fields.extend(self.filters.iter().map(|f| f.field.as_str()));
        fields
    }

    /// Pie arity rules; `None` when the slots can be rendered as a pie
    pub fn validate_pie_config(&self) -> Option<&'static str> {
        if self.axis.is_none() && self.legend.is_none() {
            return Some("Pie requires axis or legend");
        }
        match self.values.len() {
            0 => Some("Pie requires one numeric value"),
            1 => None,
            _ => Some("Pie should have a single value"),
        }
    }
}

fn resolve_index<T>(items: &[T], item: SlotItem<'_>, field: impl Fn(&T) -> &String) -> Option<usize> {
    match item {
        SlotItem::Index(index) if index < items.len() => Some(index),
        SlotItem::Index(_) => None,
        SlotItem::Field(name) => items.iter().position(|i| field(i) == name),
    }
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() || from == to {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pie(axis: Option<&str>, legend: Option<&str>, values: &[&str]) -> ReportConfig {
        let mut config = ReportConfig::default();
        config.set_chart_type(ChartType::Pie);
        if let Some(a) = axis {
            config.add_to_slot(Slot::Axis, a, None);
        }
        if let Some(l) = legend {
            config.add_to_slot(Slot::Legend, l, None);
        }
        for v in values {
            config.add_to_slot(Slot::Values, v, None);
        }
        config
    }

    #[test]
    fn test_default_serializes_to_minimal_shape() {
        let json = ReportConfig::default().to_config_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"chartType": "table", "values": [], "filters": []})
        );
    }

    #[test]
    fn test_add_to_slot_semantics() {
        let mut config = ReportConfig::default();
        config.add_to_slot(Slot::Axis, "region", None);
        config.add_to_slot(Slot::Axis, "country", None);
        assert_eq!(config.axis.as_ref().unwrap().field, "country");

        config.add_to_slot(Slot::Values, "total", None);
        config.add_to_slot(Slot::Values, "qty", Some(Aggregation::Count));
        assert_eq!(
            config.values,
            vec![
                ValueSlot { field: "total".into(), aggregation: Aggregation::Sum },
                ValueSlot { field: "qty".into(), aggregation: Aggregation::Count },
            ]
        );

        config.add_to_slot(Slot::Filters, "region", None);
        assert_eq!(config.filters[0].operator, FilterOperator::Eq);
        assert!(config.filters[0].value.is_none());
    }

    #[test]
    fn test_remove_by_index_or_field_name() {
        let mut config = ReportConfig::default();
        for f in ["a", "b", "a"] {
            config.add_to_slot(Slot::Values, f, None);
        }
        config.remove_from_slot(Slot::Values, SlotItem::Field("a"));
        let fields: Vec<_> = config.values.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["b", "a"]);

        config.remove_from_slot(Slot::Values, SlotItem::Index(1));
        assert_eq!(config.values.len(), 1);

        config.remove_from_slot(Slot::Values, SlotItem::Index(7));
        assert_eq!(config.values.len(), 1);

        config.add_to_slot(Slot::Legend, "region", None);
        config.remove_from_slot(Slot::Legend, SlotItem::Index(0));
        assert!(config.legend.is_none());
    }

    #[test]
    fn test_reorder_moves_entries() {
        let mut config = ReportConfig::default();
        for f in ["a", "b", "c"] {
            config.add_to_slot(Slot::Filters, f, None);
        }
        assert!(config.reorder_slot(Slot::Filters, 0, 2));
        let fields: Vec<_> = config.filters.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["b", "c", "a"]);
        assert!(!config.reorder_slot(Slot::Filters, 0, 3));
        assert!(!config.reorder_slot(Slot::Axis, 0, 1));
    }

    #[test]
    fn test_date_grouping_requires_axis() {
        let mut config = ReportConfig::default();
        config.set_date_grouping(Some(DateGrouping::Month));
        assert!(config.axis.is_none());

        config.add_to_slot(Slot::Axis, "order_date", None);
        config.set_date_grouping(Some(DateGrouping::Month));
        assert_eq!(
            config.axis.as_ref().unwrap().date_grouping,
            Some(DateGrouping::Month)
        );
    }

    #[test]
    fn test_filter_patch() {
        let mut config = ReportConfig::default();
        config.add_filter(FilterSlot::new("total"));
        config.update_filter(0, FilterPatch::operator(FilterOperator::Between));
        config.update_filter(0, FilterPatch::range(Some("10".into()), Some("20".into())));
        let filter = &config.filters[0];
        assert_eq!(filter.operator, FilterOperator::Between);
        assert_eq!(filter.from.as_deref(), Some("10"));
        assert_eq!(filter.to.as_deref(), Some("20"));

        config.update_filter(0, FilterPatch::value(Some("x".into())));
        assert_eq!(config.filters[0].from.as_deref(), Some("10"));

        config.remove_filter(0);
        assert!(config.filters.is_empty());
    }

    #[test]
    fn test_validate_pie_config() {
        assert_eq!(
            pie(None, None, &[]).validate_pie_config(),
            Some("Pie requires axis or legend")
        );
        assert_eq!(
            pie(Some("x"), None, &[]).validate_pie_config(),
            Some("Pie requires one numeric value")
        );
        assert_eq!(
            pie(Some("x"), None, &["a", "b"]).validate_pie_config(),
            Some("Pie should have a single value")
        );
        assert_eq!(pie(None, Some("x"), &["a"]).validate_pie_config(), None);
    }

    #[test]
    fn test_round_trip_through_config_json() {
        let mut config = ReportConfig::default();
        config.set_chart_type(ChartType::Bar);
        config.add_to_slot(Slot::Axis, "order_date", None);
        config.set_date_grouping(Some(DateGrouping::Week));
        config.add_to_slot(Slot::Values, "total", Some(Aggregation::Avg));
        config.add_to_slot(Slot::Legend, "region", None);
        config.add_to_slot(Slot::Filters, "region", None);
        config.update_filter(0, FilterPatch::operator(FilterOperator::In));
        config.update_filter(0, FilterPatch::values(Some(vec!["EU".into(), "US".into()])));
        config.set_sorting(Some(Sorting {
            by: SortBy::Value,
            direction: SortDirection::Desc,
            value_field: Some("total".into()),
        }));

        let restored = ReportConfig::from_config_json(&config.to_config_json()).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_missing_attributes_take_defaults() {
        let config = ReportConfig::from_config_json(r#"{"chartType":"line"}"#).unwrap();
        assert_eq!(config.chart_type, ChartType::Line);
        assert!(config.values.is_empty());
        assert!(config.filters.is_empty());

        assert_eq!(ReportConfig::from_config_json("").unwrap(), ReportConfig::default());
        assert!(ReportConfig::from_config_json("{not json").is_err());
    }
}
