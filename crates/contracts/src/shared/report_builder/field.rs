use serde::{Deserialize, Serialize};

/// Keywords that mark a column as textual (strings, GUIDs, char data)
const TEXT_KEYWORDS: &[&str] = &[
    "string",
    "guid",
    "uniqueidentifier",
    "char",
    "text",
    "xml",
];

/// Keywords that mark a column as a date or time value
const DATE_KEYWORDS: &[&str] = &["date", "time"];

/// Keywords that mark a column as numeric (integer, decimal, floating point)
const NUMERIC_KEYWORDS: &[&str] = &[
    "int",
    "decimal",
    "numeric",
    "double",
    "float",
    "real",
    "single",
    "money",
];

/// A column discovered by a data-source check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Column name, unique within a schema
    pub name: String,
    /// Source (database) type name, e.g. "nvarchar"
    #[serde(default)]
    pub sql_type: String,
    /// Host type name, e.g. "String" or "Decimal"
    #[serde(default)]
    pub dot_net_type: String,
    #[serde(default)]
    pub is_nullable: bool,
}

impl Field {
    pub fn new(name: &str, sql_type: &str, dot_net_type: &str, is_nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            dot_net_type: dot_net_type.to_string(),
            is_nullable,
        }
    }

    /// Combined lower-cased type string all classification works on
    pub fn type_signature(&self) -> String {
        format!("{} {}", self.dot_net_type, self.sql_type).to_lowercase()
    }

    pub fn is_text(&self) -> bool {
        contains_any(&self.type_signature(), TEXT_KEYWORDS)
    }

    pub fn is_date(&self) -> bool {
        contains_any(&self.type_signature(), DATE_KEYWORDS)
    }

    pub fn is_numeric(&self) -> bool {
        contains_any(&self.type_signature(), NUMERIC_KEYWORDS)
    }

    /// Text/GUID or date/time columns can be used as the chart axis
    pub fn is_axis_compatible(&self) -> bool {
        self.is_text() || self.is_date()
    }

    pub fn is_values_compatible(&self) -> bool {
        self.is_numeric()
    }

    /// Only textual columns split series; dates are not legend material
    pub fn is_legend_compatible(&self) -> bool {
        self.is_text()
    }

    /// Filter operators offered for this column
    pub fn operators(&self) -> &'static [FilterOperator] {
        if self.is_date() || self.is_numeric() {
            FilterOperator::ORDERED
        } else {
            FilterOperator::TEXTUAL
        }
    }

    /// Case-insensitive substring match on name or type, used by the fields search box
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query) || self.type_signature().contains(&query)
    }
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

/// Filter operator vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    Contains,
    StartsWith,
    EndsWith,
    In,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    /// Operators for date-like and numeric columns
    pub const ORDERED: &'static [FilterOperator] = &[
        FilterOperator::Eq,
        FilterOperator::Ne,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::Between,
        FilterOperator::IsNull,
        FilterOperator::IsNotNull,
    ];

    /// Operators for everything else (string-like default)
    pub const TEXTUAL: &'static [FilterOperator] = &[
        FilterOperator::Eq,
        FilterOperator::Ne,
        FilterOperator::Contains,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
        FilterOperator::In,
        FilterOperator::IsNull,
        FilterOperator::IsNotNull,
    ];

    /// Wire name, also used as `<option value>` in the filter editor
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Between => "between",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::In => "in",
            FilterOperator::IsNull => "isNull",
            FilterOperator::IsNotNull => "isNotNull",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ORDERED
            .iter()
            .chain(Self::TEXTUAL.iter())
            .copied()
            .find(|op| op.as_str() == value)
    }

    /// Display label for UI
    pub fn label(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Ne => "≠",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => "≥",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "≤",
            FilterOperator::Between => "between",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "starts with",
            FilterOperator::EndsWith => "ends with",
            FilterOperator::In => "in list",
            FilterOperator::IsNull => "is empty",
            FilterOperator::IsNotNull => "is not empty",
        }
    }

    /// Whether the operator takes no operand at all
    pub fn is_unary(&self) -> bool {
        matches!(self, FilterOperator::IsNull | FilterOperator::IsNotNull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> Vec<Field> {
        vec![
            Field::new("region", "nvarchar", "String", false),
            Field::new("customer_id", "uniqueidentifier", "Guid", false),
            Field::new("order_date", "datetime2", "DateTime", true),
            Field::new("shipped_at", "datetimeoffset", "DateTimeOffset", true),
            Field::new("total", "decimal", "Decimal", false),
            Field::new("qty", "int", "Int32", false),
            Field::new("weight", "float", "Double", true),
            Field::new("is_active", "bit", "Boolean", false),
        ]
    }

    #[test]
    fn test_date_fields_are_axis_but_not_legend() {
        for field in sample_fields().iter().filter(|f| f.is_date()) {
            assert!(field.is_axis_compatible(), "{}", field.name);
            assert!(!field.is_legend_compatible(), "{}", field.name);
        }
    }

    #[test]
    fn test_numeric_fields_are_values_only() {
        for field in sample_fields()
            .iter()
            .filter(|f| f.is_numeric() && !f.is_text())
        {
            assert!(field.is_values_compatible(), "{}", field.name);
            assert!(!field.is_axis_compatible(), "{}", field.name);
            assert!(!field.is_legend_compatible(), "{}", field.name);
        }
    }

    #[test]
    fn test_text_fields_go_to_axis_and_legend() {
        let region = Field::new("region", "nvarchar", "String", false);
        assert!(region.is_axis_compatible());
        assert!(region.is_legend_compatible());
        assert!(!region.is_values_compatible());

        let guid = Field::new("customer_id", "uniqueidentifier", "Guid", false);
        assert!(guid.is_legend_compatible());
    }

    #[test]
    fn test_unknown_type_is_incompatible_everywhere() {
        let flag = Field::new("is_active", "bit", "Boolean", false);
        assert!(!flag.is_axis_compatible());
        assert!(!flag.is_values_compatible());
        assert!(!flag.is_legend_compatible());
        assert_eq!(flag.operators(), FilterOperator::TEXTUAL);
    }

    #[test]
    fn test_operator_sets() {
        let total = Field::new("total", "decimal", "Decimal", false);
        assert!(total.operators().contains(&FilterOperator::Between));
        assert!(!total.operators().contains(&FilterOperator::Contains));

        let region = Field::new("region", "nvarchar", "String", false);
        assert!(region.operators().contains(&FilterOperator::StartsWith));
        assert!(!region.operators().contains(&FilterOperator::Gt));

        for field in sample_fields() {
            let ops = field.operators();
            for required in [
                FilterOperator::Eq,
                FilterOperator::Ne,
                FilterOperator::IsNull,
                FilterOperator::IsNotNull,
            ] {
                assert!(ops.contains(&required), "{} misses {:?}", field.name, required);
            }
        }
    }

    #[test]
    fn test_operator_wire_names() {
        assert_eq!(
            serde_json::to_string(&FilterOperator::StartsWith).unwrap(),
            "\"startsWith\""
        );
        assert_eq!(FilterOperator::parse("isNotNull"), Some(FilterOperator::IsNotNull));
        assert_eq!(FilterOperator::parse("like"), None);
    }

    #[test]
    fn test_search_matches_name_or_type() {
        let total = Field::new("Total", "decimal", "Decimal", false);
        assert!(total.matches_search("tot"));
        assert!(total.matches_search("DECIMAL"));
        assert!(total.matches_search("  "));
        assert!(!total.matches_search("region"));
    }
}
