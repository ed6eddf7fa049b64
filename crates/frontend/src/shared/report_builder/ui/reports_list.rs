//! Saved reports list with search, open, edit and delete

use std::cell::Cell;
use std::rc::Rc;

use contracts::shared::report_builder::ReportDto;
use leptos::logging::log;
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::{
    Button, ButtonAppearance, ButtonSize, Input, Table, TableBody, TableCell, TableCellLayout,
    TableHeader, TableHeaderCell, TableRow,
};

use crate::layout::global_context::AppGlobalContext;
use crate::shared::report_builder::api::{HttpReportApi, ReportBuilderApi};
use crate::shared::report_builder::debounce::{BrowserTimer, Debouncer};

/// Quiet period before the search box hits the server
const SEARCH_DEBOUNCE_MS: u32 = 300;

/// Format ISO datetime string as DD.MM.YYYY HH:MM
fn format_datetime(iso: &str) -> String {
    if let (Some(date), Some(time)) = (iso.get(0..10), iso.get(11..16)) {
        let parts: Vec<&str> = date.split('-').collect();
        if parts.len() == 3 {
            return format!("{}.{}.{} {}", parts[2], parts[1], parts[0], time);
        }
    }
    iso.to_string()
}

/// "connection / view: name" line for a report row
fn source_label(report: &ReportDto) -> String {
    let kind = report
        .data_source_type
        .map(|t| t.as_str())
        .unwrap_or("?");
    format!(
        "{} / {}: {}",
        report.connection_key, kind, report.data_source_name
    )
}

struct ListServices {
    search: Debouncer,
    seq: Cell<u64>,
}

#[component]
pub fn ReportsListPage() -> impl IntoView {
    let ctx = use_context::<AppGlobalContext>().expect("AppGlobalContext not found");
    let api = HttpReportApi;

    let reports = RwSignal::new(Vec::<ReportDto>::new());
    let loading = RwSignal::new(true);
    let error = RwSignal::new(None::<String>);
    let search_query = RwSignal::new(String::new());
    let confirm_delete = RwSignal::new(None::<i64>);

    let services = StoredValue::new_local(ListServices {
        search: Debouncer::new(SEARCH_DEBOUNCE_MS, Rc::new(BrowserTimer)),
        seq: Cell::new(0),
    });
    on_cleanup(move || {
        services.try_with_value(|s| {
            s.search.cancel();
            s.seq.set(s.seq.get() + 1);
        });
    });

    // Later searches supersede earlier responses
    let load = move || {
        let Some(seq) = services.try_with_value(|s| {
            s.seq.set(s.seq.get() + 1);
            s.seq.get()
        }) else {
            return;
        };
        let query = search_query.get_untracked();
        spawn_local(async move {
            loading.set(true);
            let search = Some(query.trim()).filter(|q| !q.is_empty());
            let result = api.list_reports(search).await;
            let current = services
                .try_with_value(|s| s.seq.get() == seq)
                .unwrap_or(false);
            if !current {
                return;
            }
            match result {
                Ok(list) => {
                    reports.set(list);
                    error.set(None);
                }
                Err(e) => {
                    log!("Failed to load reports: {}", e);
                    error.set(Some(format!("Failed to load reports: {}", e)));
                }
            }
            loading.set(false);
        });
    };

    load();

    Effect::new(move |prev: Option<()>| {
        search_query.track();
        // Skip the initial run; the first load already happened
        if prev.is_some() {
            services.with_value(|s| s.search.schedule(load));
        }
    });

    let delete = move |id: i64| {
        confirm_delete.set(None);
        spawn_local(async move {
            match api.delete_report(id).await {
                Ok(()) => {
                    log!("Report {} deleted", id);
                    reports.update(|list| list.retain(|r| r.id != id));
                }
                Err(e) => error.set(Some(format!("Delete failed: {}", e))),
            }
        });
    };

    view! {
        <div class="page reports-list">
            <div class="page__header">
                <div class="page__header-left">
                    <h1 class="page__title">"Reports"</h1>
                </div>
                <div class="page__header-right">
                    <div style="width: 320px;">
                        <Input value=search_query placeholder="Search by name or description..." />
                    </div>
                    <Button appearance=ButtonAppearance::Primary on_click=move |_| ctx.open_builder(None)>
                        "New report"
                    </Button>
                </div>
            </div>

            <div class="page__content">
                {move || {
                    error
                        .get()
                        .map(|err| {
                            view! {
                                <div style="padding: 16px; color: var(--thaw-color-error-foreground-1);">
                                    {err}
                                </div>
                            }
                        })
                }}
                <Show
                    when=move || !(loading.get() && reports.with(|r| r.is_empty()))
                    fallback=|| {
                        view! {
                            <div style="padding: 48px; text-align: center;">
                                <p>"Loading..."</p>
                            </div>
                        }
                    }
                >
                    <Show
                        when=move || reports.with(|r| !r.is_empty())
                        fallback=|| {
                            view! {
                                <div style="padding: 48px; text-align: center;">
                                    <p style="color: var(--thaw-color-neutral-foreground-2);">
                                        "No reports yet"
                                    </p>
                                </div>
                            }
                        }
                    >
                        <Table>
                            <TableHeader>
                                <TableRow>
                                    <TableHeaderCell resizable=true min_width=200.0>
                                        "Name"
                                    </TableHeaderCell>
                                    <TableHeaderCell resizable=true min_width=260.0>
                                        "Description"
                                    </TableHeaderCell>
                                    <TableHeaderCell resizable=true min_width=220.0>
                                        "Data source"
                                    </TableHeaderCell>
                                    <TableHeaderCell min_width=140.0>"Updated"</TableHeaderCell>
                                    <TableHeaderCell min_width=220.0>"Actions"</TableHeaderCell>
                                </TableRow>
                            </TableHeader>
                            <TableBody>
                                <For
                                    each=move || reports.get()
                                    key=|r| (r.id, r.updated_at.clone())
                                    children=move |report: ReportDto| {
                                        let id = report.id;
                                        let updated = report
                                            .updated_at
                                            .as_deref()
                                            .or(report.created_at.as_deref())
                                            .map(format_datetime)
                                            .unwrap_or_default();
                                        let source = source_label(&report);
                                        view! {
                                            <TableRow>
                                                <TableCell>
                                                    <TableCellLayout>
                                                        <a
                                                            href="#"
                                                            class="reports-list__name"
                                                            on:click=move |e| {
                                                                e.prevent_default();
                                                                ctx.open_viewer(id);
                                                            }
                                                        >
                                                            {report.name.clone()}
                                                        </a>
                                                    </TableCellLayout>
                                                </TableCell>
                                                <TableCell>
                                                    <TableCellLayout>{report.description.clone()}</TableCellLayout>
                                                </TableCell>
                                                <TableCell>
                                                    <TableCellLayout>{source}</TableCellLayout>
                                                </TableCell>
                                                <TableCell>
                                                    <TableCellLayout>{updated}</TableCellLayout>
                                                </TableCell>
                                                <TableCell>
                                                    <TableCellLayout>
                                                        <Show
                                                            when=move || confirm_delete.get() == Some(id)
                                                            fallback=move || {
                                                                view! {
                                                                    <Button
                                                                        size=ButtonSize::Small
                                                                        on_click=move |_| ctx.open_viewer(id)
                                                                    >
                                                                        "Open"
                                                                    </Button>
                                                                    <Button
                                                                        size=ButtonSize::Small
                                                                        on_click=move |_| ctx.open_builder(Some(id))
                                                                    >
                                                                        "Edit"
                                                                    </Button>
                                                                    <Button
                                                                        size=ButtonSize::Small
                                                                        appearance=ButtonAppearance::Subtle
                                                                        on_click=move |_| confirm_delete.set(Some(id))
                                                                    >
                                                                        "Delete"
                                                                    </Button>
                                                                }
                                                            }
                                                        >
                                                            <span class="reports-list__confirm">"Delete?"</span>
                                                            <Button
                                                                size=ButtonSize::Small
                                                                appearance=ButtonAppearance::Primary
                                                                on_click=move |_| delete(id)
                                                            >
                                                                "Yes"
                                                            </Button>
                                                            <Button
                                                                size=ButtonSize::Small
                                                                on_click=move |_| confirm_delete.set(None)
                                                            >
                                                                "No"
                                                            </Button>
                                                        </Show>
                                                    </TableCellLayout>
                                                </TableCell>
                                            </TableRow>
                                        }
                                    }
                                />
                            </TableBody>
                        </Table>
                    </Show>
                </Show>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::report_builder::DataSourceType;

    #[test]
    fn test_format_datetime() {
        assert_eq!(format_datetime("2024-03-05T14:07:00Z"), "05.03.2024 14:07");
        assert_eq!(format_datetime("garbage"), "garbage");
        assert_eq!(format_datetime("2024-03-0é 14:07:00"), "2024-03-0é 14:07:00");
        assert_eq!(format_datetime("2024-03-05T14:0ü"), "2024-03-05T14:0ü");
    }

    #[test]
    fn test_source_label() {
        let report = ReportDto {
            connection_key: "crm".into(),
            data_source_type: Some(DataSourceType::View),
            data_source_name: "vw_sales".into(),
            ..Default::default()
        };
        assert_eq!(source_label(&report), "crm / view: vw_sales");
    }
}
