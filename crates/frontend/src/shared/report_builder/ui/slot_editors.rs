use contracts::shared::report_builder::{
    Aggregation, DateGrouping, FilterOperator, FilterPatch, FilterSlot, SortBy, SortDirection,
    Sorting,
};
use leptos::prelude::*;

use crate::shared::report_builder::store::ReportBuilderStore;

/// Empty input clears the operand
fn operand(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Comma separated list for the `in` operator
fn parse_list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

#[component]
pub fn AggregationSelect(store: ReportBuilderStore, index: usize) -> impl IntoView {
    let current = move || {
        store
            .config
            .with(|c| c.values.get(index).map(|v| v.aggregation).unwrap_or_default())
    };

    view! {
        <select
            class="form__select form__select--compact"
            aria-label="Aggregation"
            on:change=move |ev| {
                if let Some(aggregation) = Aggregation::parse(&event_target_value(&ev)) {
                    store.set_aggregation(index, aggregation);
                }
            }
        >
            {Aggregation::ALL
                .into_iter()
                .map(|a| {
                    view! {
                        <option value=a.as_str() selected=move || current() == a>
                            {a.as_str().to_uppercase()}
                        </option>
                    }
                })
                .collect_view()}
        </select>
    }
}

#[component]
pub fn DateGroupingSelect(store: ReportBuilderStore) -> impl IntoView {
    let current = move || {
        store
            .config
            .with(|c| c.axis.as_ref().and_then(|a| a.date_grouping))
    };

    view! {
        <select
            class="form__select form__select--compact"
            aria-label="Date grouping"
            on:change=move |ev| store.set_date_grouping(DateGrouping::parse(&event_target_value(&ev)))
        >
            <option value="" selected=move || current().is_none()>
                "No grouping"
            </option>
            {DateGrouping::ALL
                .into_iter()
                .map(|g| {
                    view! {
                        <option value=g.as_str() selected=move || current() == Some(g)>
                            {format!("By {}", g.as_str())}
                        </option>
                    }
                })
                .collect_view()}
        </select>
    }
}

/// Sort by axis or by a value column, plus direction
#[component]
pub fn SortingEditor(store: ReportBuilderStore) -> impl IntoView {
    let sorting = move || store.config.with(|c| c.sorting.clone());
    let value_fields = move || {
        store
            .config
            .with(|c| c.values.iter().map(|v| v.field.clone()).collect::<Vec<_>>())
    };

    let on_by = move |ev| {
        let direction = sorting().map(|s| s.direction).unwrap_or_default();
        let next = match event_target_value(&ev).as_str() {
            "axis" => Some(Sorting {
                by: SortBy::Axis,
                direction,
                value_field: None,
            }),
            "value" => Some(Sorting {
                by: SortBy::Value,
                direction,
                value_field: value_fields().into_iter().next(),
            }),
            _ => None,
        };
        store.set_sorting(next);
    };

    let on_direction = move |ev| {
        if let Some(mut s) = sorting() {
            s.direction = if event_target_value(&ev) == "desc" {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            store.set_sorting(Some(s));
        }
    };

    let on_value_field = move |ev| {
        if let Some(mut s) = sorting() {
            s.value_field = operand(event_target_value(&ev));
            store.set_sorting(Some(s));
        }
    };

    let by = move || sorting().map(|s| s.by);

    view! {
        <div class="rb-sorting">
            <span class="rb-sorting__label">"Sort"</span>
            <select class="form__select form__select--compact" aria-label="Sort by" on:change=on_by>
                <option value="" selected=move || by().is_none()>
                    "Unsorted"
                </option>
                <option value="axis" selected=move || by() == Some(SortBy::Axis)>
                    "By axis"
                </option>
                <option
                    value="value"
                    selected=move || by() == Some(SortBy::Value)
                    disabled=move || value_fields().is_empty()
                >
                    "By value"
                </option>
            </select>
            <Show when=move || { by() == Some(SortBy::Value) && value_fields().len() > 1 }>
                <select
                    class="form__select form__select--compact"
                    aria-label="Sort value"
                    on:change=on_value_field
                >
                    {move || {
                        let selected = sorting().and_then(|s| s.value_field);
                        value_fields()
                            .into_iter()
                            .map(|f| {
                                let is_selected = selected.as_deref() == Some(f.as_str());
                                view! {
                                    <option value=f.clone() selected=is_selected>
                                        {f.clone()}
                                    </option>
                                }
                            })
                            .collect_view()
                    }}
                </select>
            </Show>
            <Show when=move || by().is_some()>
                <select
                    class="form__select form__select--compact"
                    aria-label="Sort direction"
                    on:change=on_direction
                >
                    <option
                        value="asc"
                        selected=move || sorting().map(|s| s.direction) == Some(SortDirection::Asc)
                    >
                        "Ascending"
                    </option>
                    <option
                        value="desc"
                        selected=move || sorting().map(|s| s.direction) == Some(SortDirection::Desc)
                    >
                        "Descending"
                    </option>
                </select>
            </Show>
        </div>
    }
}

/// Operator plus the operands that operator needs
#[component]
pub fn FilterEditor(store: ReportBuilderStore, index: usize) -> impl IntoView {
    let filter = move || store.config.with(|c| c.filters.get(index).cloned());
    let operator = move || filter().map(|f| f.operator).unwrap_or(FilterOperator::Eq);
    let operators = move || {
        filter()
            .and_then(|f| store.field(&f.field))
            .map(|f| f.operators())
            .unwrap_or(FilterOperator::TEXTUAL)
    };
    let field_name = move || filter().map(|f| f.field).unwrap_or_default();

    let operands = move || {
        let op = operator();
        let current = filter().unwrap_or_else(|| FilterSlot::new(""));
        if op.is_unary() {
            return ().into_any();
        }
        match op {
            FilterOperator::Between => {
                view! {
                    <input
                        class="form__input form__input--compact"
                        type="text"
                        placeholder="from"
                        prop:value=current.from.clone().unwrap_or_default()
                        on:change=move |ev| {
                            let to = filter().and_then(|f| f.to);
                            store.update_filter(index, FilterPatch::range(operand(event_target_value(&ev)), to))
                        }
                    />
                    <span class="rb-filter__sep">"–"</span>
                    <input
                        class="form__input form__input--compact"
                        type="text"
                        placeholder="to"
                        prop:value=current.to.clone().unwrap_or_default()
                        on:change=move |ev| {
                            let from = filter().and_then(|f| f.from);
                            store.update_filter(index, FilterPatch::range(from, operand(event_target_value(&ev))))
                        }
                    />
                }
                    .into_any()
            }
            FilterOperator::In => {
                view! {
                    <input
                        class="form__input form__input--compact"
                        type="text"
                        placeholder="a, b, c"
                        prop:value=current.values.clone().map(|v| v.join(", ")).unwrap_or_default()
                        on:change=move |ev| {
                            store.update_filter(index, FilterPatch::values(parse_list(&event_target_value(&ev))))
                        }
                    />
                }
                    .into_any()
            }
            _ => {
                view! {
                    <input
                        class="form__input form__input--compact"
                        type="text"
                        placeholder="value"
                        prop:value=current.value.clone().unwrap_or_default()
                        on:change=move |ev| {
                            store.update_filter(index, FilterPatch::value(operand(event_target_value(&ev))))
                        }
                    />
                }
                    .into_any()
            }
        }
    };

    view! {
        <div class="rb-filter">
            <span class="rb-filter__field">{field_name}</span>
            <select
                class="form__select form__select--compact"
                aria-label="Operator"
                on:change=move |ev| {
                    if let Some(op) = FilterOperator::parse(&event_target_value(&ev)) {
                        store.update_filter(index, FilterPatch::operator(op));
                    }
                }
            >
                {move || {
                    let current = operator();
                    operators()
                        .iter()
                        .map(|op| {
                            view! {
                                <option value=op.as_str() selected=*op == current>
                                    {op.label()}
                                </option>
                            }
                        })
                        .collect_view()
                }}
            </select>
            {operands}
            <button
                class="rb-chip__remove"
                title="Remove filter"
                on:click=move |_| store.remove_filter(index)
            >
                "×"
            </button>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(" north, south ,,east "),
            Some(vec!["north".to_string(), "south".to_string(), "east".to_string()])
        );
        assert_eq!(parse_list(" , "), None);
    }

    #[test]
    fn test_operand_trims_and_clears() {
        assert_eq!(operand("  42 ".to_string()), Some("42".to_string()));
        assert_eq!(operand("   ".to_string()), None);
    }
}
