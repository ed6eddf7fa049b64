use contracts::shared::report_builder::{ChartType, PreviewResponse};
use leptos::logging::log;
use leptos::prelude::*;
use thaw::{Button, ButtonAppearance};

use super::charts::ReportChart;
use crate::shared::export::{csv_file_name, export_preview_csv};
use crate::shared::report_builder::store::{BuilderPhase, ReportBuilderStore};

/// Live preview of the current config
#[component]
pub fn PreviewPanel(store: ReportBuilderStore) -> impl IntoView {
    let pie_problem = move || {
        store.config.with(|c| {
            (c.chart_type == ChartType::Pie)
                .then(|| c.validate_pie_config())
                .flatten()
        })
    };

    let body = move || {
        match store.phase() {
            BuilderPhase::Unchecked | BuilderPhase::Loading => {
                return view! { <p class="rb-placeholder">"Check the data source to start building"</p> }
                    .into_any();
            }
            BuilderPhase::Checked => {
                return view! { <p class="rb-placeholder">"Drag fields onto the slots to see a preview"</p> }
                    .into_any();
            }
            BuilderPhase::Configuring | BuilderPhase::Saving => {}
        }
        if let Some(problem) = pie_problem() {
            return view! { <p class="rb-placeholder rb-placeholder--warning">{problem}</p> }.into_any();
        }
        if let Some(error) = store.preview_error.get() {
            return view! { <p class="rb-status rb-status--error">{format!("Preview failed: {}", error)}</p> }
                .into_any();
        }
        match store.preview.get() {
            Some(preview) if preview.is_empty() => {
                view! { <p class="rb-placeholder">"The query returned no rows"</p> }.into_any()
            }
            Some(preview) => {
                let preview = Signal::derive(move || preview.clone());
                view! { <ReportChart config=store.config preview=preview /> }.into_any()
            }
            None => view! { <p class="rb-placeholder">"Waiting for preview..."</p> }.into_any(),
        }
    };

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
    let has_rows = move || {
        store
            .preview
            .with(|p| p.as_ref().map(|p| !PreviewResponse::is_empty(p)).unwrap_or(false))
    };

    view! {
        <section class="rb-preview" aria-live="polite">
            <div class="rb-preview__header">
                <h3 class="rb-section-title">"Preview"</h3>
                <Show when=move || store.preview_loading.get()>
                    <span class="rb-spinner" aria-label="Loading preview"></span>
                </Show>
                <Button
                    appearance=ButtonAppearance::Subtle
                    on_click=export
                    disabled=move || !has_rows()
                >
                    "Export CSV"
                </Button>
            </div>
            <div class="rb-preview__body" class:rb-preview__body--stale=move || store.preview_loading.get()>
                {body}
            </div>
        </section>
    }
}
