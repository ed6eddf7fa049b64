use contracts::shared::report_builder::{ConnectionDto, DataSourceType};
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::{Button, ButtonAppearance};

use crate::shared::report_builder::store::ReportBuilderStore;

/// Report name and description
#[component]
pub fn MetaForm(store: ReportBuilderStore) -> impl IntoView {
    view! {
        <div class="rb-meta">
            <div class="form__group">
                <label class="form__label" for="rb-name">"Report name"</label>
                <input
                    id="rb-name"
                    class="form__input"
                    type="text"
                    placeholder="e.g. Sales by region"
                    prop:value=move || store.meta.with(|m| m.name.clone())
                    on:input=move |ev| store.set_name(event_target_value(&ev))
                />
            </div>
            <div class="form__group">
                <label class="form__label" for="rb-description">"Description"</label>
                <textarea
                    id="rb-description"
                    class="form__textarea"
                    rows="2"
                    prop:value=move || store.meta.with(|m| m.description.clone())
                    on:input=move |ev| store.set_description(event_target_value(&ev))
                ></textarea>
            </div>
        </div>
    }
}

/// Connection, type and name of the data source plus the "Check" action
#[component]
pub fn DataSourceForm(store: ReportBuilderStore) -> impl IntoView {
    let run_check = move |_| spawn_local(store.check());

    view! {
        <div class="rb-source">
            <div class="form__group">
                <label class="form__label" for="rb-connection">"Connection"</label>
                <select
                    id="rb-connection"
                    class="form__select"
                    disabled=move || store.connections_loading.get()
                    on:change=move |ev| store.set_connection_key(event_target_value(&ev))
                >
                    <option value="">"-- Select connection --"</option>
                    <For
                        each=move || store.connections.get()
                        key=|c| c.key.clone()
                        children=move |connection: ConnectionDto| {
                            let key = connection.key.clone();
                            let label = connection.display_name().to_string();
                            let value = key.clone();
                            view! {
                                <option
                                    value=value
                                    selected=move || store.meta.with(|m| m.connection_key == key)
                                >
                                    {label}
                                </option>
                            }
                        }
                    />
                </select>
            </div>

            <div class="form__group">
                <label class="form__label" for="rb-type">"Type"</label>
                <select
                    id="rb-type"
                    class="form__select"
                    on:change=move |ev| {
                        if let Some(t) = DataSourceType::parse(&event_target_value(&ev)) {
                            store.set_data_source_type(t);
                        }
                    }
                >
                    {DataSourceType::ALL
                        .into_iter()
                        .map(|t| {
                            view! {
                                <option
                                    value=t.as_str()
                                    selected=move || store.meta.with(|m| m.data_source_type == t)
                                >
                                    {t.label()}
                                </option>
                            }
                        })
                        .collect_view()}
                </select>
            </div>

            <div class="form__group">
                <label class="form__label" for="rb-source-name">"Name"</label>
                <input
                    id="rb-source-name"
                    class="form__input"
                    type="text"
                    placeholder="e.g. vw_sales"
                    prop:value=move || store.meta.with(|m| m.data_source_name.clone())
                    on:input=move |ev| store.set_data_source_name(event_target_value(&ev))
                    on:keydown=move |ev| {
                        if ev.key() == "Enter" {
                            spawn_local(store.check());
                        }
                    }
                />
            </div>

            <Button
                appearance=ButtonAppearance::Primary
                on_click=run_check
                disabled=move || store.checking.get()
            >
                {move || if store.checking.get() { "Checking..." } else { "Check" }}
            </Button>

            <div class="rb-source__status">
                {move || {
                    if let Some(error) = store.check_error.get() {
                        view! { <span class="rb-status rb-status--error">{error}</span> }.into_any()
                    } else if store.data_source_checked.get() {
                        let count = store.schema.with(|s| s.len());
                        view! {
                            <span class="rb-status rb-status--ok">
                                {format!("Data source found: {} fields", count)}
                            </span>
                        }
                            .into_any()
                    } else {
                        view! { <span class="rb-status">"Not checked"</span> }.into_any()
                    }
                }}
            </div>
        </div>
    }
}
