use contracts::shared::report_builder::Slot;
use leptos::prelude::*;

use super::slot_editors::{AggregationSelect, DateGroupingSelect, FilterEditor, SortingEditor};
use crate::shared::report_builder::store::ReportBuilderStore;

/// The four drop zones of the report config
#[component]
pub fn SlotsPanel(store: ReportBuilderStore) -> impl IntoView {
    view! {
        <div class="rb-slots">
            <SlotZone store=store slot=Slot::Axis>
                <AxisChip store=store />
            </SlotZone>
            <SlotZone store=store slot=Slot::Values>
                <ValueList store=store />
            </SlotZone>
            <SlotZone store=store slot=Slot::Legend>
                <LegendChip store=store />
            </SlotZone>
            <SlotZone store=store slot=Slot::Filters>
                <FilterList store=store />
            </SlotZone>
            <SortingEditor store=store />
        </div>
    }
}

#[component]
fn SlotZone(store: ReportBuilderStore, slot: Slot, children: Children) -> impl IntoView {
    let highlighted = move || store.drag.with(|d| d.highlighted_slot() == Some(slot));
    let dragging = move || store.drag.with(|d| d.is_active());

    view! {
        <section
            class="rb-slot"
            class:rb-slot--active=dragging
            class:rb-slot--over=highlighted
            data-drop-id=slot.drop_id()
            aria-label=slot.label()
            aria-dropeffect=move || if dragging() { "copy" } else { "none" }
        >
            <h4 class="rb-slot__title">{slot.label()}</h4>
            <div class="rb-slot__body">{children()}</div>
        </section>
    }
}

#[component]
fn AxisChip(store: ReportBuilderStore) -> impl IntoView {
    move || {
        match store.config.with(|c| c.axis.as_ref().map(|a| a.field.clone())) {
            Some(field) => view! {
                <div class="rb-chip">
                    <span class="rb-chip__name">{field}</span>
                    <Show when=move || store.axis_is_date()>
                        <DateGroupingSelect store=store />
                    </Show>
                    <button
                        class="rb-chip__remove"
                        title="Remove"
                        on:click=move |_| store.remove_from_slot(Slot::Axis, 0)
                    >
                        "×"
                    </button>
                </div>
            }
                .into_any(),
            None => view! { <p class="rb-slot__empty">"Drop a text or date field"</p> }.into_any(),
        }
    }
}

#[component]
fn ValueList(store: ReportBuilderStore) -> impl IntoView {
    let entries = move || {
        store.config.with(|c| {
            c.values
                .iter()
                .enumerate()
                .map(|(i, v)| (i, v.field.clone()))
                .collect::<Vec<_>>()
        })
    };
    let count = move || store.config.with(|c| c.values.len());

    view! {
        <Show
            when=move || { count() > 0 }
            fallback=|| view! { <p class="rb-slot__empty">"Drop numeric fields"</p> }
        >
            <ul class="rb-slot__list">
                <For
                    each=entries
                    key=|entry| entry.clone()
                    children=move |(index, field)| {
                        view! {
                            <li class="rb-chip">
                                <AggregationSelect store=store index=index />
                                <span class="rb-chip__name">{field}</span>
                                <button
                                    class="rb-chip__move"
                                    title="Move up"
                                    disabled={index == 0}
                                    on:click=move |_| store.reorder_slot(Slot::Values, index, index.saturating_sub(1))
                                >
                                    "↑"
                                </button>
                                <button
                                    class="rb-chip__move"
                                    title="Move down"
                                    disabled=move || { index + 1 >= count() }
                                    on:click=move |_| store.reorder_slot(Slot::Values, index, index + 1)
                                >
                                    "↓"
                                </button>
                                <button
                                    class="rb-chip__remove"
                                    title="Remove"
                                    on:click=move |_| store.remove_from_slot(Slot::Values, index)
                                >
                                    "×"
                                </button>
                            </li>
                        }
                    }
                />
            </ul>
        </Show>
    }
}

#[component]
fn LegendChip(store: ReportBuilderStore) -> impl IntoView {
    move || match store.config.with(|c| c.legend.as_ref().map(|l| l.field.clone())) {
        Some(field) => view! {
            <div class="rb-chip">
                <span class="rb-chip__name">{field}</span>
                <button
                    class="rb-chip__remove"
                    title="Remove"
                    on:click=move |_| store.remove_from_slot(Slot::Legend, 0)
                >
                    "×"
                </button>
            </div>
        }
            .into_any(),
        None => view! { <p class="rb-slot__empty">"Drop a text field to split series"</p> }
            .into_any(),
    }
}

#[component]
fn FilterList(store: ReportBuilderStore) -> impl IntoView {
    let entries = move || {
        store.config.with(|c| {
            c.filters
                .iter()
                .enumerate()
                .map(|(i, f)| (i, f.field.clone()))
                .collect::<Vec<_>>()
        })
    };

    view! {
        <Show
            when=move || store.config.with(|c| !c.filters.is_empty())
            fallback=|| view! { <p class="rb-slot__empty">"Drop any field to filter by it"</p> }
        >
            <For
                each=entries
                key=|entry| entry.clone()
                children=move |(index, _)| view! { <FilterEditor store=store index=index /> }
            />
        </Show>
    }
}
