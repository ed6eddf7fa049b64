//! Window-level pointer tracking and the floating drag ghost

use contracts::shared::report_builder::Slot;
use leptos::ev;
use leptos::logging::log;
use leptos::prelude::*;

use crate::shared::report_builder::dnd::{DragOutcome, DragState};
use crate::shared::report_builder::store::ReportBuilderStore;

/// Slot whose drop target element is under the given viewport point
fn slot_at(x: f64, y: f64) -> Option<Slot> {
    let document = web_sys::window()?.document()?;
    let element = document.element_from_point(x as f32, y as f32)?;
    let target = element.closest("[data-drop-id]").ok()??;
    Slot::from_drop_id(&target.get_attribute("data-drop-id")?)
}

/// Apply the result of a finished drag to the store
pub fn handle_drag_outcome(store: ReportBuilderStore, outcome: DragOutcome) {
    if let DragOutcome::Drop { field, slot } = outcome {
        if let Err(rejection) = store.drop_field(slot, &field) {
            log!("Drop of {} on {:?} rejected: {}", field, slot, rejection);
        }
    }
}

#[component]
pub fn DragLayer(store: ReportBuilderStore) -> impl IntoView {
    let is_idle = move || store.drag.with_untracked(|d| matches!(d, DragState::Idle));

    let on_move = window_event_listener(ev::pointermove, move |ev| {
        if is_idle() {
            return;
        }
        let (x, y) = (ev.client_x() as f64, ev.client_y() as f64);
        let over = slot_at(x, y);
        store.drag.update(|d| {
            d.pointer_move(x, y, over);
        });
    });

    let on_up = window_event_listener(ev::pointerup, move |ev| {
        if is_idle() {
            return;
        }
        let over = slot_at(ev.client_x() as f64, ev.client_y() as f64);
        let mut outcome = DragOutcome::None;
        store.drag.update(|d| outcome = d.pointer_up(over));
        handle_drag_outcome(store, outcome);
    });

    let on_cancel = window_event_listener(ev::pointercancel, move |_| {
        store.drag.update(|d| {
            d.cancel();
        });
    });

    on_cleanup(move || {
        on_move.remove();
        on_up.remove();
        on_cancel.remove();
    });

    view! {
        {move || {
            store
                .drag
                .with(|d| {
                    d.pointer_position().zip(d.active_field().map(str::to_string))
                })
                .map(|((x, y), field)| {
                    view! {
                        <div
                            class="rb-drag-ghost"
                            style=format!("left: {}px; top: {}px;", x + 12.0, y + 12.0)
                        >
                            {field}
                        </div>
                    }
                })
        }}
        {move || {
            store
                .drop_message
                .get()
                .map(|message| {
                    view! {
                        <div class="rb-drop-message" role="status">
                            {message}
                        </div>
                    }
                })
        }}
    }
}
