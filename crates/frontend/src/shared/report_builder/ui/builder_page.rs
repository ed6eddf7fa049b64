//! Report builder page: meta form, data source, fields, slots and preview

use std::rc::Rc;

use contracts::shared::report_builder::ChartType;
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::{Button, ButtonAppearance};

use super::data_source_form::{DataSourceForm, MetaForm};
use super::drag_layer::DragLayer;
use super::fields_panel::FieldsPanel;
use super::preview_panel::PreviewPanel;
use super::slots::SlotsPanel;
use crate::layout::global_context::AppGlobalContext;
use crate::shared::report_builder::api::HttpReportApi;
use crate::shared::report_builder::debounce::BrowserTimer;
use crate::shared::report_builder::store::ReportBuilderStore;

#[component]
pub fn ReportBuilderPage(report_id: Option<i64>) -> impl IntoView {
    let ctx = use_context::<AppGlobalContext>().expect("AppGlobalContext not found");

    // One store per page instance, disposed with the page
    let store = ReportBuilderStore::new(Rc::new(HttpReportApi), Rc::new(BrowserTimer));
    on_cleanup(move || store.dispose());

    spawn_local(store.load_connections());
    if let Some(id) = report_id {
        spawn_local(store.load(id));
    }

    let save = move |_| {
        spawn_local(async move {
            if let Some(id) = store.save().await {
                ctx.open_viewer(id);
            }
        });
    };

    let is_edit = move || store.meta.with(|m| m.id.is_some());

    view! {
        <div class="page report-builder">
            <div class="page__header">
                <div class="page__header-left">
                    <h1 class="page__title">
                        {move || if is_edit() { "Edit report" } else { "New report" }}
                    </h1>
                </div>
                <div class="page__header-right">
                    <Button
                        appearance=ButtonAppearance::Secondary
                        on_click=move |_| match store.meta.get_untracked().id {
                            Some(id) => ctx.open_viewer(id),
                            None => ctx.open_reports(),
                        }
                    >
                        "Cancel"
                    </Button>
                    <Button
                        appearance=ButtonAppearance::Primary
                        on_click=save
                        disabled=move || store.saving.get() || store.loading.get()
                    >
                        {move || match (store.saving.get(), is_edit()) {
                            (true, _) => "Saving...",
                            (false, true) => "Update",
                            (false, false) => "Save",
                        }}
                    </Button>
                </div>
            </div>

            {move || {
                store
                    .toast
                    .get()
                    .map(|message| {
                        view! {
                            <div class="rb-toast" role="alert">
                                <span>{message}</span>
                                <button class="rb-toast__close" on:click=move |_| store.toast.set(None)>
                                    "×"
                                </button>
                            </div>
                        }
                    })
            }}

            <Show
                when=move || !store.loading.get()
                fallback=|| view! { <div class="rb-loading">"Loading report..."</div> }
            >
                <div class="page__content">
                    <MetaForm store=store />
                    <DataSourceForm store=store />
                    <div class="rb-workspace">
                        <FieldsPanel store=store />
                        <div class="rb-config">
                            <ChartTypeSwitch store=store />
                            <SlotsPanel store=store />
                        </div>
                        <PreviewPanel store=store />
                    </div>
                </div>
            </Show>
            <DragLayer store=store />
        </div>
    }
}

#[component]
fn ChartTypeSwitch(store: ReportBuilderStore) -> impl IntoView {
    view! {
        <div class="rb-chart-types" role="radiogroup" aria-label="Chart type">
            {ChartType::ALL
                .into_iter()
                .map(|chart_type| {
                    view! {
                        <button
                            class="rb-chart-types__item"
                            role="radio"
                            class:rb-chart-types__item--active=move || {
                                store.config.with(|c| c.chart_type == chart_type)
                            }
                            aria-checked=move || {
                                store.config.with(|c| c.chart_type == chart_type).to_string()
                            }
                            disabled=move || !store.data_source_checked.get()
                            on:click=move |_| store.set_chart_type(chart_type)
                        >
                            {chart_type.label()}
                        </button>
                    }
                })
                .collect_view()}
        </div>
    }
}
