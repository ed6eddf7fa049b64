use std::rc::Rc;

use leptos::logging::log;
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::{Button, ButtonAppearance};

use super::charts::ReportChart;
use crate::layout::global_context::AppGlobalContext;
use crate::shared::export::{csv_file_name, export_preview_csv};
use crate::shared::report_builder::api::HttpReportApi;
use crate::shared::report_builder::debounce::BrowserTimer;
use crate::shared::report_builder::store::ReportBuilderStore;

/// Read-only view of a saved report: loads it, re-checks the source and runs the query once
#[component]
pub fn ReportViewerPage(report_id: i64) -> impl IntoView {
    let ctx = use_context::<AppGlobalContext>().expect("AppGlobalContext not found");

    let store = ReportBuilderStore::new(Rc::new(HttpReportApi), Rc::new(BrowserTimer));
    on_cleanup(move || store.dispose());

    spawn_local(async move {
        store.load(report_id).await;
        store.flush_preview().await;
    });

    let export = move |_| {
        let Some(preview) = store.preview.get_untracked() else {
            return;
        };
        let filename = store.meta.with_untracked(|m| csv_file_name(&m.name));
        if let Err(e) = export_preview_csv(&preview, &filename) {
            log!("CSV export failed: {}", e);
            store.toast.set(Some(format!("Export failed: {}", e)));
        }
    };

    let body = move || {
        if store.loading.get() || store.checking.get() {
            return view! { <div class="rb-loading">"Loading report..."</div> }.into_any();
        }
        if let Some(error) = store.check_error.get() {
            return view! { <p class="rb-status rb-status--error">{error}</p> }.into_any();
        }
        if let Some(error) = store.preview_error.get() {
            return view! { <p class="rb-status rb-status--error">{format!("Query failed: {}", error)}</p> }
                .into_any();
        }
        match store.preview.get() {
            Some(preview) if !preview.is_empty() => {
                let preview = Signal::derive(move || preview.clone());
                view! { <ReportChart config=store.config preview=preview /> }.into_any()
            }
            Some(_) => view! { <p class="rb-placeholder">"The query returned no rows"</p> }.into_any(),
            None if store.preview_loading.get() => {
                view! { <div class="rb-loading">"Running query..."</div> }.into_any()
            }
            None => view! { <p class="rb-placeholder">"Nothing to show for this report"</p> }.into_any(),
        }
    };

    view! {
        <div class="page report-viewer">
            <div class="page__header">
                <div class="page__header-left">
                    <h1 class="page__title">{move || store.meta.with(|m| m.name.clone())}</h1>
                    <p class="page__subtitle">
                        {move || store.meta.with(|m| m.description.clone())}
                    </p>
                </div>
                <div class="page__header-right">
                    <Button appearance=ButtonAppearance::Secondary on_click=move |_| ctx.open_reports()>
                        "Back"
                    </Button>
                    <Button
                        appearance=ButtonAppearance::Secondary
                        on_click=export
                        disabled=move || store.preview.with(|p| p.as_ref().map(|p| p.is_empty()).unwrap_or(true))
                    >
                        "Export CSV"
                    </Button>
                    <Button
                        appearance=ButtonAppearance::Primary
                        on_click=move |_| ctx.open_builder(Some(report_id))
                    >
                        "Edit"
                    </Button>
                </div>
            </div>
            {move || {
                store
                    .toast
                    .get()
                    .map(|message| view! { <div class="rb-toast" role="alert">{message}</div> })
            }}
            <div class="page__content">{body}</div>
        </div>
    }
}
