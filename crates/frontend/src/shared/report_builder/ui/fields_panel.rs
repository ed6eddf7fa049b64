use contracts::shared::report_builder::{Field, Slot};
use leptos::prelude::*;
use thaw::Input;

use super::drag_layer::handle_drag_outcome;
use crate::shared::report_builder::dnd::{DragKey, DragOutcome};
use crate::shared::report_builder::store::ReportBuilderStore;

/// Discovered fields: searchable list of drag sources
#[component]
pub fn FieldsPanel(store: ReportBuilderStore) -> impl IntoView {
    view! {
        <aside class="rb-fields" class:rb-disabled=move || !store.data_source_checked.get()>
            <h3 class="rb-section-title">"Fields"</h3>
            <Input value=store.field_search placeholder="Search by name or type..." />
            <Show
                when=move || store.data_source_checked.get()
                fallback=|| {
                    view! { <p class="rb-hint">"Check a data source to see its fields"</p> }
                }
            >
                <ul class="rb-fields__list" role="listbox" aria-label="Fields">
                    <For
                        each=move || store.filtered_fields()
                        key=|f| f.name.clone()
                        children=move |field: Field| view! { <FieldItem store=store field=field /> }
                    />
                </ul>
                <Show when=move || store.filtered_fields().is_empty()>
                    <p class="rb-hint">"No fields match the search"</p>
                </Show>
            </Show>
            <p class="rb-hint rb-hint--small">
                "Drag a field onto a slot, or focus it and press Space, choose a slot with the arrow keys and press Space again."
            </p>
        </aside>
    }
}

/// Letters for the slots a field may go to
fn compat_badges(field: &Field) -> String {
    [Slot::Axis, Slot::Values, Slot::Legend]
        .into_iter()
        .filter(|s| s.accepts(field))
        .map(|s| &s.label()[..1])
        .collect::<Vec<_>>()
        .join(" ")
}

#[component]
fn FieldItem(store: ReportBuilderStore, field: Field) -> impl IntoView {
    let name = StoredValue::new(field.name.clone());
    let badges = compat_badges(&field);
    let type_label = if field.dot_net_type.is_empty() {
        field.sql_type.clone()
    } else {
        field.dot_net_type.clone()
    };
    let nullable = field.is_nullable;

    let is_carried = move || {
        store
            .drag
            .with(|d| name.with_value(|n| d.active_field() == Some(n.as_str())))
    };
    let keyboard_target = move || {
        if !is_carried() {
            return None;
        }
        store.drag.with(|d| d.highlighted_slot())
    };

    view! {
        <li
            class="rb-field"
            class:rb-field--dragging=is_carried
            tabindex="0"
            role="option"
            aria-grabbed=move || is_carried().to_string()
            on:pointerdown=move |ev| {
                if ev.button() != 0 || !store.data_source_checked.get_untracked() {
                    return;
                }
                ev.prevent_default();
                let (x, y) = (ev.client_x() as f64, ev.client_y() as f64);
                name.with_value(|n| store.drag.update(|d| d.pointer_down(n, x, y)));
            }
            on:keydown=move |ev| {
                let Some(key) = DragKey::from_key(&ev.key()) else {
                    return;
                };
                if key != DragKey::Activate && !store.drag.with_untracked(|d| d.is_active()) {
                    return;
                }
                ev.prevent_default();
                let mut outcome = DragOutcome::None;
                name.with_value(|n| store.drag.update(|d| outcome = d.key(n, key)));
                handle_drag_outcome(store, outcome);
            }
        >
            <span class="rb-field__name">{field.name.clone()}</span>
            <span class="rb-field__type">
                {type_label}
                {nullable.then_some("?")}
            </span>
            <span class="rb-field__compat" title="Axis / Values / Legend">{badges}</span>
            {move || {
                keyboard_target()
                    .map(|slot| {
                        view! { <span class="rb-field__target">{format!("→ {}", slot.label())}</span> }
                    })
            }}
        </li>
    }
}
