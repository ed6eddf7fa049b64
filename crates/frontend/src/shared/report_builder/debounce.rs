//! Cancelable trailing-edge debouncer
//!
//! Only one timer is live per debouncer. Scheduling again replaces the pending
//! task and restarts the quiet period. The timer source is injected so tests can
//! fire or flush work deterministically.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Handle of a started timer; dropping it cancels the timer
pub struct TimerHandle(#[allow(dead_code)] Box<dyn Any>);

impl TimerHandle {
    pub fn new<T: Any>(inner: T) -> Self {
        Self(Box::new(inner))
    }
}

/// Source of one-shot timers
pub trait TimerDriver {
    fn start(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle;
}

/// Browser timers through `gloo_timers` (`setTimeout`, cleared on drop)
#[derive(Clone, Copy, Default)]
pub struct BrowserTimer;

impl TimerDriver for BrowserTimer {
    fn start(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle {
        TimerHandle::new(gloo_timers::callback::Timeout::new(delay_ms, callback))
    }
}

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct DebounceState {
    timer: Option<TimerHandle>,
    pending: Option<Task>,
    generation: u64,
}

/// Runs the last scheduled task once the quiet period has passed
#[derive(Clone)]
pub struct Debouncer {
    delay_ms: u32,
    driver: Rc<dyn TimerDriver>,
    state: Rc<RefCell<DebounceState>>,
}

impl Debouncer {
    pub fn new(delay_ms: u32, driver: Rc<dyn TimerDriver>) -> Self {
        Self {
            delay_ms,
            driver,
            state: Rc::new(RefCell::new(DebounceState::default())),
        }
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Replace any pending task and restart the timer
    pub fn schedule(&self, task: impl FnOnce() + 'static) {
        let generation = {
            let mut state = self.state.borrow_mut();
            // Drop the previous timer before starting the next one
            state.timer = None;
            state.generation += 1;
            state.pending = Some(Box::new(task));
            state.generation
        };

        let weak = Rc::downgrade(&self.state);
        let handle = self.driver.start(
            self.delay_ms,
            Box::new(move || {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                let task = {
                    let mut state = state.borrow_mut();
                    if state.generation != generation {
                        return;
                    }
                    state.timer = None;
                    state.pending.take()
                };
                if let Some(task) = task {
                    task();
                }
            }),
        );

        let mut state = self.state.borrow_mut();
        if state.generation == generation && state.pending.is_some() {
            state.timer = Some(handle);
        }
    }

    /// Drop the pending task without running it
    pub fn cancel(&self) {
        let mut state = self.state.borrow_mut();
        state.timer = None;
        state.pending = None;
        state.generation += 1;
    }

    /// Cancel the timer and hand the pending task to the caller
    pub fn take_pending(&self) -> Option<Task> {
        let mut state = self.state.borrow_mut();
        state.timer = None;
        state.generation += 1;
        state.pending.take()
    }

    /// Run the pending task now, if any
    pub fn flush(&self) -> bool {
        match self.take_pending() {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().pending.is_some()
    }
}

// ============================================================================
// Manual timer for tests
// ============================================================================

#[cfg(test)]
pub use manual::ManualTimer;
