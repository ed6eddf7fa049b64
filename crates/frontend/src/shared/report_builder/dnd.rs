//! Drag state machine for moving discovered fields into slots.
//!
//! Pointer drags start as `Pressed` and only become `Dragging` after the pointer
//! has travelled `ACTIVATION_DISTANCE` pixels, so a plain click never drops.
//! Keyboard drags pick a field up, cycle through the slots and drop.

use contracts::shared::report_builder::Slot;

/// Minimum pointer travel (px) before a press turns into a drag
pub const ACTIVATION_DISTANCE: f64 = 5.0;

/// Current drag interaction
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Pointer is down on a field but has not moved far enough yet
    Pressed { field: String, origin: (f64, f64) },
    /// Pointer drag in progress
    Dragging {
        field: String,
        position: (f64, f64),
        over: Option<Slot>,
    },
    /// Field picked up from the keyboard; `target` is the focused slot
    KeyboardDragging { field: String, target: Slot },
}

/// Result of finishing an interaction
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Nothing to do (click, or drop outside any slot)
    None,
    Drop { field: String, slot: Slot },
    Cancelled,
}

/// Keys understood by keyboard dragging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKey {
    /// Space or Enter: pick up, or drop when already carrying a field
    Activate,
    Next,
    Previous,
    Cancel,
}

impl DragKey {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            " " | "Spacebar" | "Enter" => Some(DragKey::Activate),
            "ArrowDown" | "ArrowRight" => Some(DragKey::Next),
            "ArrowUp" | "ArrowLeft" => Some(DragKey::Previous),
            "Escape" | "Esc" => Some(DragKey::Cancel),
            _ => None,
        }
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn cycle(slot: Slot, step: isize) -> Slot {
    let all = Slot::ALL;
    let index = all.iter().position(|s| *s == slot).unwrap_or(0) as isize;
    let len = all.len() as isize;
    all[((index + step).rem_euclid(len)) as usize]
}

impl DragState {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            DragState::Dragging { .. } | DragState::KeyboardDragging { .. }
        )
    }

    /// Field being carried, once the drag is active
    pub fn active_field(&self) -> Option<&str> {
        match self {
            DragState::Dragging { field, .. } | DragState::KeyboardDragging { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }

    /// Slot under the pointer or focused by the keyboard
    pub fn highlighted_slot(&self) -> Option<Slot> {
        match self {
            DragState::Dragging { over, .. } => *over,
            DragState::KeyboardDragging { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Ghost position for pointer drags
    pub fn pointer_position(&self) -> Option<(f64, f64)> {
        match self {
            DragState::Dragging { position, .. } => Some(*position),
            _ => None,
        }
    }

    // ========================================================================
    // Pointer
    // ========================================================================

    pub fn pointer_down(&mut self, field: &str, x: f64, y: f64) {
        if matches!(self, DragState::KeyboardDragging { .. }) {
            return;
        }
        *self = DragState::Pressed {
            field: field.to_string(),
            origin: (x, y),
        };
    }

    /// Track movement; returns true when this move activated the drag
    pub fn pointer_move(&mut self, x: f64, y: f64, over: Option<Slot>) -> bool {
        match self {
            DragState::Pressed { field, origin } => {
                if distance(*origin, (x, y)) < ACTIVATION_DISTANCE {
                    return false;
                }
                *self = DragState::Dragging {
                    field: std::mem::take(field),
                    position: (x, y),
                    over,
                };
                true
            }
            DragState::Dragging {
                position, over: o, ..
            } => {
                *position = (x, y);
                *o = over;
                false
            }
            _ => false,
        }
    }

    /// Release; drops onto `over` if the drag was active
    pub fn pointer_up(&mut self, over: Option<Slot>) -> DragOutcome {
        let state = std::mem::take(self);
        match state {
            DragState::Dragging { field, .. } => match over {
                Some(slot) => DragOutcome::Drop { field, slot },
                None => DragOutcome::None,
            },
            DragState::KeyboardDragging { .. } => {
                *self = state;
                DragOutcome::None
            }
            _ => DragOutcome::None,
        }
    }

    // ========================================================================
    // Keyboard
    // ========================================================================

    /// Key pressed while `field` has focus
    pub fn key(&mut self, field: &str, key: DragKey) -> DragOutcome {
        match (&*self, key) {
            (DragState::KeyboardDragging { field: carried, target }, DragKey::Activate) => {
                let outcome = DragOutcome::Drop {
                    field: carried.clone(),
                    slot: *target,
                };
                *self = DragState::Idle;
                outcome
            }
            (DragState::KeyboardDragging { field: carried, target }, DragKey::Next) => {
                *self = DragState::KeyboardDragging {
                    field: carried.clone(),
                    target: cycle(*target, 1),
                };
                DragOutcome::None
            }
            (DragState::KeyboardDragging { field: carried, target }, DragKey::Previous) => {
                *self = DragState::KeyboardDragging {
                    field: carried.clone(),
                    target: cycle(*target, -1),
                };
                DragOutcome::None
            }
            (DragState::KeyboardDragging { .. }, DragKey::Cancel) => {
                *self = DragState::Idle;
                DragOutcome::Cancelled
            }
            (DragState::Idle, DragKey::Activate) => {
                *self = DragState::KeyboardDragging {
                    field: field.to_string(),
                    target: Slot::Axis,
                };
                DragOutcome::None
            }
            _ => DragOutcome::None,
        }
    }

    pub fn cancel(&mut self) -> DragOutcome {
        if matches!(self, DragState::Idle) {
            return DragOutcome::None;
        }
        *self = DragState::Idle;
        DragOutcome::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_without_movement_is_not_a_drop() {
        let mut state = DragState::default();
        state.pointer_down("region", 10.0, 10.0);
        assert!(!state.pointer_move(12.0, 13.0, Some(Slot::Axis)));
        assert!(!state.is_active());
        assert_eq!(state.pointer_up(Some(Slot::Axis)), DragOutcome::None);
        assert_eq!(state, DragState::Idle);
    }

    #[test]
    fn test_pointer_drag_activates_past_threshold() {
        let mut state = DragState::default();
        state.pointer_down("region", 0.0, 0.0);
        assert!(state.pointer_move(3.0, 4.0, None));
        assert_eq!(state.active_field(), Some("region"));

        state.pointer_move(50.0, 40.0, Some(Slot::Legend));
        assert_eq!(state.highlighted_slot(), Some(Slot::Legend));
        assert_eq!(state.pointer_position(), Some((50.0, 40.0)));

        assert_eq!(
            state.pointer_up(Some(Slot::Legend)),
            DragOutcome::Drop {
                field: "region".into(),
                slot: Slot::Legend
            }
        );
        assert_eq!(state, DragState::Idle);
    }

    #[test]
    fn test_release_outside_slots() {
        let mut state = DragState::default();
        state.pointer_down("total", 0.0, 0.0);
        state.pointer_move(100.0, 0.0, None);
        assert_eq!(state.pointer_up(None), DragOutcome::None);
        assert_eq!(state, DragState::Idle);
    }

    #[test]
    fn test_keyboard_pick_cycle_drop() {
        let mut state = DragState::default();
        assert_eq!(state.key("total", DragKey::Activate), DragOutcome::None);
        assert_eq!(state.highlighted_slot(), Some(Slot::Axis));

        state.key("total", DragKey::Next);
        assert_eq!(state.highlighted_slot(), Some(Slot::Values));
        state.key("total", DragKey::Previous);
        state.key("total", DragKey::Previous);
        assert_eq!(state.highlighted_slot(), Some(Slot::Filters));
        state.key("total", DragKey::Next);
        state.key("total", DragKey::Next);

        assert_eq!(
            state.key("total", DragKey::Activate),
            DragOutcome::Drop {
                field: "total".into(),
                slot: Slot::Values
            }
        );
        assert!(!state.is_active());
    }

    #[test]
    fn test_keyboard_escape_cancels() {
        let mut state = DragState::default();
        state.key("region", DragKey::Activate);
        assert_eq!(state.key("region", DragKey::Cancel), DragOutcome::Cancelled);
        assert_eq!(state, DragState::Idle);
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(DragKey::from_key(" "), Some(DragKey::Activate));
        assert_eq!(DragKey::from_key("Enter"), Some(DragKey::Activate));
        assert_eq!(DragKey::from_key("ArrowLeft"), Some(DragKey::Previous));
        assert_eq!(DragKey::from_key("Tab"), None);
    }
}
