//! Table and SVG chart renderers for preview data

use contracts::shared::report_builder::{ChartType, PreviewResponse, ReportConfig};
use leptos::prelude::*;

use crate::shared::report_builder::chart_model::{
    arc_path, bar_layout, build_chart_data, category_x, format_number, line_paths, pie_slices,
    series_color, table_cell, ChartData, CHART_HEIGHT, CHART_PADDING, CHART_WIDTH,
};

/// Renders preview data in the configured chart type
#[component]
pub fn ReportChart(
    #[prop(into)] config: Signal<ReportConfig>,
    #[prop(into)] preview: Signal<PreviewResponse>,
) -> impl IntoView {
    move || {
        let chart_type = config.with(|c| c.chart_type);
        if chart_type == ChartType::Table {
            return view! { <PreviewTable preview=preview /> }.into_any();
        }
        let data = preview.with(|p| config.with(|c| build_chart_data(p, c)));
        if data.is_empty() {
            return view! { <p class="rb-hint">"Nothing to plot"</p> }.into_any();
        }
        match chart_type {
            ChartType::Bar => bar_chart(&data).into_any(),
            ChartType::Line => line_chart(&data).into_any(),
            ChartType::Pie => pie_chart(&data).into_any(),
            ChartType::Table => ().into_any(),
        }
    }
}

#[component]
fn PreviewTable(preview: Signal<PreviewResponse>) -> impl IntoView {
    move || {
        preview.with(|p| {
            let header = p
                .columns
                .iter()
                .map(|c| view! { <th class="rb-table__th">{c.clone()}</th> })
                .collect_view();
            let rows = p
                .rows
                .iter()
                .map(|row| {
                    let cells = p
                        .columns
                        .iter()
                        .map(|c| {
                            let value = row.get(c.as_str()).cloned().unwrap_or_default();
                            let (text, numeric) = table_cell(&value);
                            let class = if numeric {
                                "rb-table__td rb-table__td--number"
                            } else {
                                "rb-table__td"
                            };
                            view! { <td class=class>{text}</td> }
                        })
                        .collect_view();
                    view! { <tr>{cells}</tr> }
                })
                .collect_view();
            view! {
                <div class="rb-table-wrap">
                    <table class="rb-table">
                        <thead>
                            <tr>{header}</tr>
                        </thead>
                        <tbody>{rows}</tbody>
                    </table>
                </div>
            }
        })
    }
}

fn legend(names: Vec<String>) -> impl IntoView {
    view! {
        <ul class="rb-legend">
            {names
                .into_iter()
                .enumerate()
                .map(|(i, name)| {
                    view! {
                        <li class="rb-legend__item">
                            <span
                                class="rb-legend__swatch"
                                style=format!("background: {};", series_color(i))
                            ></span>
                            {name}
                        </li>
                    }
                })
                .collect_view()}
        </ul>
    }
}

fn view_box() -> String {
    format!("0 0 {} {}", CHART_WIDTH, CHART_HEIGHT)
}

fn category_labels(data: &ChartData) -> impl IntoView {
    let count = data.categories.len();
    data.categories
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let x = category_x(i, count, CHART_WIDTH, CHART_PADDING);
            view! {
                <text
                    class="rb-chart__label"
                    x=format!("{:.2}", x)
                    y=format!("{:.2}", CHART_HEIGHT - CHART_PADDING / 2.0)
                    text-anchor="middle"
                >
                    {label.clone()}
                </text>
            }
        })
        .collect_view()
}

fn baseline() -> impl IntoView {
    let y = format!("{:.2}", CHART_HEIGHT - CHART_PADDING);
    view! {
        <line
            class="rb-chart__axis"
            x1=format!("{:.2}", CHART_PADDING)
            y1=y.clone()
            x2=format!("{:.2}", CHART_WIDTH - CHART_PADDING)
            y2=y
            stroke="#999"
        />
    }
}

fn series_names(data: &ChartData) -> Vec<String> {
    data.series.iter().map(|s| s.name.clone()).collect()
}

fn bar_chart(data: &ChartData) -> impl IntoView {
    let bars = bar_layout(data, CHART_WIDTH, CHART_HEIGHT, CHART_PADDING)
        .into_iter()
        .map(|bar| {
            let title = format!("{}: {}", data.categories[bar.category], format_number(bar.value));
            view! {
                <rect
                    x=format!("{:.2}", bar.x)
                    y=format!("{:.2}", bar.y)
                    width=format!("{:.2}", bar.width)
                    height=format!("{:.2}", bar.height)
                    fill=series_color(bar.series)
                >
                    <title>{title}</title>
                </rect>
            }
        })
        .collect_view();

    view! {
        <div class="rb-chart">
            <svg class="rb-chart__svg" viewBox=view_box() role="img" aria-label="Bar chart">
                {baseline()}
                {bars}
                {category_labels(data)}
            </svg>
            {legend(series_names(data))}
        </div>
    }
}

fn line_chart(data: &ChartData) -> impl IntoView {
    let paths = line_paths(data, CHART_WIDTH, CHART_HEIGHT, CHART_PADDING)
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            view! { <path d=d fill="none" stroke=series_color(i) stroke-width="2" /> }
        })
        .collect_view();

    view! {
        <div class="rb-chart">
            <svg class="rb-chart__svg" viewBox=view_box() role="img" aria-label="Line chart">
                {baseline()}
                {paths}
                {category_labels(data)}
            </svg>
            {legend(series_names(data))}
        </div>
    }
}

fn pie_chart(data: &ChartData) -> impl IntoView {
    let slices = pie_slices(data);
    let cx = CHART_WIDTH / 2.0;
    let cy = CHART_HEIGHT / 2.0;
    let r = CHART_HEIGHT / 2.0 - CHART_PADDING / 2.0;

    let names = slices
        .iter()
        .map(|s| format!("{} ({:.1}%)", s.label, s.percent()))
        .collect::<Vec<_>>();
    let paths = slices
        .into_iter()
        .enumerate()
        .map(|(i, slice)| {
            let title = format!("{}: {}", slice.label, format_number(slice.value));
            view! {
                <path
                    d=arc_path(cx, cy, r, slice.start_angle, slice.end_angle)
                    fill=series_color(i)
                    stroke="#fff"
                >
                    <title>{title}</title>
                </path>
            }
        })
        .collect_view();

    view! {
        <div class="rb-chart">
            <svg class="rb-chart__svg" viewBox=view_box() role="img" aria-label="Pie chart">
                {paths}
            </svg>
            {legend(names)}
        </div>
    }
}
