use contracts::shared::report_builder::{
    DateGrouping, Field, FilterOperator, FilterSlot, ReportConfig, Slot, SortBy, SortDirection,
    ValueSlot,
};

/// Upper bound on rows a preview returns
pub const PREVIEW_ROW_LIMIT: usize = 1000;

/// Result of query building
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// SQL query string
    pub sql: String,
    /// Bound parameters
    pub params: Vec<QueryParam>,
    /// Output column names, in select order
    pub columns: Vec<String>,
}

/// Query parameter
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Integer(i64),
    Numeric(f64),
}

/// Double-quoted SQLite identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escape LIKE wildcards; used with `ESCAPE '\'`
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn date_bucket(grouping: DateGrouping) -> &'static str {
    match grouping {
        DateGrouping::Day => "%Y-%m-%d",
        DateGrouping::Week => "%Y-W%W",
        DateGrouping::Month => "%Y-%m",
        DateGrouping::Year => "%Y",
    }
}

/// Builds the preview `SELECT` for a report config over one data source
pub struct QueryBuilder<'a> {
    source: &'a str,
    schema: &'a [Field],
    config: &'a ReportConfig,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(source: &'a str, schema: &'a [Field], config: &'a ReportConfig) -> Self {
        Self {
            source,
            schema,
            config,
        }
    }

    /// Build the SQL query
    pub fn build(&self) -> Result<QueryResult, String> {
        self.validate_fields()?;

        let (select_clause, columns) = if self.is_aggregate() {
            self.build_select_clause()
        } else {
            self.build_raw_select_clause()
        };
        let (where_clause, params) = self.build_where_clause()?;
        let group_by_clause = self.build_group_by_clause();
        let order_by_clause = self.build_order_by_clause();

        let mut sql = format!(
            "SELECT {} FROM {}",
            select_clause,
            quote_ident(self.source)
        );
        if !where_clause.is_empty() {
            sql.push_str(&format!(" WHERE {}", where_clause));
        }
        if !group_by_clause.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", group_by_clause));
        }
        if !order_by_clause.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", order_by_clause));
        }
        sql.push_str(&format!(" LIMIT {}", PREVIEW_ROW_LIMIT));

        Ok(QueryResult {
            sql,
            params,
            columns,
        })
    }

    /// Any of axis, legend or values turns the query into a grouped aggregate
    fn is_aggregate(&self) -> bool {
        self.config.axis.is_some() || self.config.legend.is_some() || !self.config.values.is_empty()
    }

    /// Every referenced field must exist and suit its slot
    fn validate_fields(&self) -> Result<(), String> {
        for name in self.config.referenced_fields() {
            self.find_field(name)?;
        }
        let placed = self
            .config
            .axis
            .iter()
            .map(|a| (Slot::Axis, a.field.as_str()))
            .chain(self.config.values.iter().map(|v| (Slot::Values, v.field.as_str())))
            .chain(self.config.legend.iter().map(|l| (Slot::Legend, l.field.as_str())));
        for (slot, name) in placed {
            let field = self.find_field(name)?;
            if !slot.accepts(field) {
                return Err(slot.rejection_message(field));
            }
        }
        Ok(())
    }

    /// Legend field, unless it is the axis as well
    fn legend_field(&self) -> Option<&str> {
        let legend = self.config.legend.as_ref()?.field.as_str();
        match &self.config.axis {
            Some(axis) if axis.field == legend => None,
            _ => Some(legend),
        }
    }

    /// Axis column, bucketed by `strftime` when a date grouping applies
    fn axis_expression(&self) -> Option<String> {
        let axis = self.config.axis.as_ref()?;
        let column = quote_ident(&axis.field);
        let is_date = self
            .find_field(&axis.field)
            .map(|f| f.is_date())
            .unwrap_or(false);
        match axis.date_grouping {
            Some(grouping) if is_date => Some(format!(
                "strftime('{}', {})",
                date_bucket(grouping),
                column
            )),
            _ => Some(column),
        }
    }

    /// Value slots with a distinct output alias each
    fn distinct_values(&self) -> Vec<&ValueSlot> {
        let mut seen = Vec::new();
        let mut values = Vec::new();
        for value in &self.config.values {
            let alias = value.column_alias();
            if !seen.contains(&alias) {
                seen.push(alias);
                values.push(value);
            }
        }
        values
    }

    /// Build SELECT clause with grouping and aggregated columns
    fn build_select_clause(&self) -> (String, Vec<String>) {
        let mut select = Vec::new();
        let mut columns = Vec::new();

        if let (Some(axis), Some(expr)) = (&self.config.axis, self.axis_expression()) {
            select.push(format!("{} AS {}", expr, quote_ident(&axis.field)));
            columns.push(axis.field.clone());
        }
        if let Some(legend) = self.legend_field() {
            select.push(quote_ident(legend));
            columns.push(legend.to_string());
        }
        for value in self.distinct_values() {
            let alias = value.column_alias();
            select.push(format!(
                "{}({}) AS {}",
                value.aggregation.to_sql(),
                quote_ident(&value.field),
                quote_ident(&alias)
            ));
            columns.push(alias);
        }

        (select.join(", "), columns)
    }

    /// Raw rows: every discovered column, filters only
    fn build_raw_select_clause(&self) -> (String, Vec<String>) {
        let columns: Vec<String> = self.schema.iter().map(|f| f.name.clone()).collect();
        let select = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        (select, columns)
    }

    /// Build WHERE clause with filters; filters missing their operands are skipped
    fn build_where_clause(&self) -> Result<(String, Vec<QueryParam>), String> {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        for filter in &self.config.filters {
            if let Some((sql, mut filter_params)) = self.filter_to_sql(filter)? {
                conditions.push(sql);
                params.append(&mut filter_params);
            }
        }

        Ok((conditions.join(" AND "), params))
    }

    fn filter_to_sql(&self, filter: &FilterSlot) -> Result<Option<(String, Vec<QueryParam>)>, String> {
        let field = self.find_field(&filter.field)?;
        let column = quote_ident(&field.name);
        let value = filter.value.as_deref().filter(|v| !v.trim().is_empty());
        let mut params = Vec::new();

        let sql = match filter.operator {
            FilterOperator::IsNull => format!("{} IS NULL", column),
            FilterOperator::IsNotNull => format!("{} IS NOT NULL", column),
            FilterOperator::Between => {
                let from = filter.from.as_deref().filter(|v| !v.trim().is_empty());
                let to = filter.to.as_deref().filter(|v| !v.trim().is_empty());
                match (from, to) {
                    (Some(f), Some(t)) => {
                        self.push_typed_param(&mut params, f, field)?;
                        self.push_typed_param(&mut params, t, field)?;
                        format!("{} BETWEEN ? AND ?", column)
                    }
                    (Some(f), None) => {
                        self.push_typed_param(&mut params, f, field)?;
                        format!("{} >= ?", column)
                    }
                    (None, Some(t)) => {
                        self.push_typed_param(&mut params, t, field)?;
                        format!("{} <= ?", column)
                    }
                    (None, None) => return Ok(None),
                }
            }
            FilterOperator::In => {
                let values: Vec<&str> = filter
                    .values
                    .iter()
                    .flatten()
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .collect();
                if values.is_empty() {
                    return Ok(None);
                }
                for v in &values {
                    self.push_typed_param(&mut params, v, field)?;
                }
                let placeholders: Vec<_> = (0..values.len()).map(|_| "?").collect();
                format!("{} IN ({})", column, placeholders.join(", "))
            }
            FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith => {
                let Some(v) = value else { return Ok(None) };
                let escaped = escape_like(v);
                let pattern = match filter.operator {
                    FilterOperator::Contains => format!("%{}%", escaped),
                    FilterOperator::StartsWith => format!("{}%", escaped),
                    _ => format!("%{}", escaped),
                };
                params.push(QueryParam::Text(pattern));
                format!("{} LIKE ? ESCAPE '\\'", column)
            }
            FilterOperator::Eq
            | FilterOperator::Ne
            | FilterOperator::Gt
            | FilterOperator::Gte
            | FilterOperator::Lt
            | FilterOperator::Lte => {
                let Some(v) = value else { return Ok(None) };
                self.push_typed_param(&mut params, v, field)?;
                let op = match filter.operator {
                    FilterOperator::Eq => "=",
                    FilterOperator::Ne => "<>",
                    FilterOperator::Gt => ">",
                    FilterOperator::Gte => ">=",
                    FilterOperator::Lt => "<",
                    _ => "<=",
                };
                format!("{} {} ?", column, op)
            }
        };

        Ok(Some((sql, params)))
    }

    /// Build GROUP BY clause
    fn build_group_by_clause(&self) -> String {
        let mut columns = Vec::new();
        if let Some(expr) = self.axis_expression() {
            columns.push(expr);
        }
        if let Some(legend) = self.legend_field() {
            columns.push(quote_ident(legend));
        }
        columns.join(", ")
    }

    /// Build ORDER BY clause; grouped queries default to axis order
    fn build_order_by_clause(&self) -> String {
        let axis_alias = self.config.axis.as_ref().map(|a| quote_ident(&a.field));
        let legend_alias = self.legend_field().map(quote_ident);

        let mut columns = Vec::new();
        match &self.config.sorting {
            Some(sorting) => {
                let direction = match sorting.direction {
                    SortDirection::Asc => "ASC",
                    SortDirection::Desc => "DESC",
                };
                let primary = match sorting.by {
                    SortBy::Axis => axis_alias.clone().or_else(|| legend_alias.clone()),
                    SortBy::Value => self.sort_value_alias(sorting.value_field.as_deref()),
                };
                if let Some(primary) = primary {
                    columns.push(format!("{} {}", primary, direction));
                }
            }
            None => {
                if let Some(axis) = &axis_alias {
                    columns.push(format!("{} ASC", axis));
                }
            }
        }
        if let Some(legend) = legend_alias {
            if !columns.iter().any(|c| c.starts_with(&legend)) {
                columns.push(format!("{} ASC", legend));
            }
        }
        columns.join(", ")
    }

    /// Alias of the value to sort by: the named field, else the first value
    fn sort_value_alias(&self, value_field: Option<&str>) -> Option<String> {
        let values = self.distinct_values();
        let chosen = value_field
            .and_then(|name| values.iter().find(|v| v.field == name))
            .or_else(|| values.first())?;
        Some(quote_ident(&chosen.column_alias()))
    }

    /// Find a field definition by name
    fn find_field(&self, name: &str) -> Result<&'a Field, String> {
        self.schema
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| format!("Field not found: {}", name))
    }

    /// Push a typed parameter based on field type
    fn push_typed_param(
        &self,
        params: &mut Vec<QueryParam>,
        value: &str,
        field: &Field,
    ) -> Result<(), String> {
        let value = value.trim();
        if field.is_numeric() && !field.is_text() {
            if field.dot_net_type == "Int64" {
                let int_val = value
                    .parse::<i64>()
                    .map_err(|_| format!("Invalid integer value for {}: {}", field.name, value))?;
                params.push(QueryParam::Integer(int_val));
            } else {
                let num_val = value
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid numeric value for {}: {}", field.name, value))?;
                params.push(QueryParam::Numeric(num_val));
            }
        } else {
            params.push(QueryParam::Text(value.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::report_builder::{
        Aggregation, AxisSlot, ChartType, FilterPatch, LegendSlot, Sorting,
    };

    fn schema() -> Vec<Field> {
        vec![
            Field::new("region", "TEXT", "String", false),
            Field::new("channel", "VARCHAR(20)", "String", true),
            Field::new("order_date", "DATE", "DateTime", false),
            Field::new("total", "DECIMAL(12, 2)", "Decimal", false),
            Field::new("qty", "INTEGER", "Int64", true),
        ]
    }

    fn build(config: &ReportConfig) -> Result<QueryResult, String> {
        let schema = schema();
        QueryBuilder::new("vw_sales", &schema, config).build()
    }

    fn axis(field: &str) -> Option<AxisSlot> {
        Some(AxisSlot {
            field: field.to_string(),
            date_grouping: None,
        })
    }

    #[test]
    fn test_axis_and_value() {
        let mut config = ReportConfig {
            axis: axis("region"),
            ..Default::default()
        };
        config.add_to_slot(Slot::Values, "total", None);

        let query = build(&config).unwrap();
        assert_eq!(
            query.sql,
            "SELECT \"region\" AS \"region\", SUM(\"total\") AS \"sum_total\" FROM \"vw_sales\" \
             GROUP BY \"region\" ORDER BY \"region\" ASC LIMIT 1000"
        );
        assert_eq!(query.columns, vec!["region", "sum_total"]);
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_legend_and_sorting_by_value() {
        let mut config = ReportConfig {
            chart_type: ChartType::Bar,
            axis: axis("region"),
            legend: Some(LegendSlot {
                field: "channel".into(),
            }),
            sorting: Some(Sorting {
                by: SortBy::Value,
                direction: SortDirection::Desc,
                value_field: Some("qty".into()),
            }),
            ..Default::default()
        };
        config.add_to_slot(Slot::Values, "total", None);
        config.add_to_slot(Slot::Values, "qty", Some(Aggregation::Count));

        let query = build(&config).unwrap();
        assert_eq!(
            query.sql,
            "SELECT \"region\" AS \"region\", \"channel\", SUM(\"total\") AS \"sum_total\", \
             COUNT(\"qty\") AS \"count_qty\" FROM \"vw_sales\" GROUP BY \"region\", \"channel\" \
             ORDER BY \"count_qty\" DESC, \"channel\" ASC LIMIT 1000"
        );
        assert_eq!(query.columns, vec!["region", "channel", "sum_total", "count_qty"]);
    }

    #[test]
    fn test_date_grouping_buckets_the_axis() {
        let mut config = ReportConfig {
            axis: Some(AxisSlot {
                field: "order_date".into(),
                date_grouping: Some(DateGrouping::Month),
            }),
            ..Default::default()
        };
        config.add_to_slot(Slot::Values, "total", Some(Aggregation::Avg));

        let query = build(&config).unwrap();
        assert!(query
            .sql
            .starts_with("SELECT strftime('%Y-%m', \"order_date\") AS \"order_date\", AVG(\"total\")"));
        assert!(query.sql.contains("GROUP BY strftime('%Y-%m', \"order_date\")"));
    }

    #[test]
    fn test_filters_bind_typed_params() {
        let mut config = ReportConfig {
            axis: axis("region"),
            ..Default::default()
        };
        config.add_to_slot(Slot::Values, "total", None);
        config.add_to_slot(Slot::Filters, "qty", None);
        config.update_filter(0, FilterPatch::operator(FilterOperator::Gte));
        config.update_filter(0, FilterPatch::value(Some("2".into())));
        config.add_to_slot(Slot::Filters, "region", None);
        config.update_filter(1, FilterPatch::operator(FilterOperator::In));
        config.update_filter(1, FilterPatch::values(Some(vec!["North".into(), "South".into()])));
        config.add_to_slot(Slot::Filters, "channel", None);
        config.update_filter(2, FilterPatch::operator(FilterOperator::Contains));
        config.update_filter(2, FilterPatch::value(Some("50%".into())));
        config.add_to_slot(Slot::Filters, "order_date", None);
        config.update_filter(3, FilterPatch::operator(FilterOperator::Between));
        config.update_filter(3, FilterPatch::range(Some("2024-01-01".into()), None));

        let query = build(&config).unwrap();
        assert!(query.sql.contains(
            "WHERE \"qty\" >= ? AND \"region\" IN (?, ?) AND \"channel\" LIKE ? ESCAPE '\\' \
             AND \"order_date\" >= ?"
        ));
        assert_eq!(
            query.params,
            vec![
                QueryParam::Integer(2),
                QueryParam::Text("North".into()),
                QueryParam::Text("South".into()),
                QueryParam::Text("%50\\%%".into()),
                QueryParam::Text("2024-01-01".into()),
            ]
        );
    }

    #[test]
    fn test_incomplete_filters_are_skipped() {
        let mut config = ReportConfig::default();
        config.add_to_slot(Slot::Filters, "region", None);
        config.add_to_slot(Slot::Filters, "channel", None);
        config.update_filter(1, FilterPatch::operator(FilterOperator::IsNull));

        let query = build(&config).unwrap();
        assert_eq!(
            query.sql,
            "SELECT \"region\", \"channel\", \"order_date\", \"total\", \"qty\" FROM \"vw_sales\" \
             WHERE \"channel\" IS NULL LIMIT 1000"
        );
        assert_eq!(query.columns.len(), 5);
    }

    #[test]
    fn test_bad_numeric_operand() {
        let mut config = ReportConfig::default();
        config.add_to_slot(Slot::Filters, "total", None);
        config.update_filter(0, FilterPatch::value(Some("lots".into())));
        assert_eq!(
            build(&config).unwrap_err(),
            "Invalid numeric value for total: lots"
        );
    }

    #[test]
    fn test_unknown_and_incompatible_fields_are_rejected() {
        let config = ReportConfig {
            axis: axis("nope"),
            ..Default::default()
        };
        assert_eq!(build(&config).unwrap_err(), "Field not found: nope");

        let mut config = ReportConfig::default();
        config.add_to_slot(Slot::Values, "region", None);
        assert!(build(&config).is_err());
    }

    #[test]
    fn test_values_without_axis_aggregate_everything() {
        let mut config = ReportConfig::default();
        config.add_to_slot(Slot::Values, "total", Some(Aggregation::Max));
        config.add_to_slot(Slot::Values, "total", Some(Aggregation::Max));

        let query = build(&config).unwrap();
        assert_eq!(
            query.sql,
            "SELECT MAX(\"total\") AS \"max_total\" FROM \"vw_sales\" LIMIT 1000"
        );
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("order date"), "\"order date\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
