//! Controller lifecycle: Uninitialized → Started → Running (self-loop).
//!
//! There is no terminal state; the host stops driving `update()` to stop.
//! `Start` is accepted from every state and re-initializes the controller.

/// Controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// Created, `start()` not yet called.
    #[default]
    Uninitialized,
    /// `start()` done, no cycle executed yet.
    Started,
    /// At least one cycle executed.
    Running,
}

/// Lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    /// `start()` called.
    Start,
    /// `update(dt)` called.
    Cycle,
}

/// Result of a transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded, new state.
    Ok(ControllerState),
    /// Transition rejected, with reason.
    Rejected(&'static str),
}

/// Lifecycle manager holding the current state.
#[derive(Debug, Clone, Default)]
pub struct ControllerStateMachine {
    state: ControllerState,
}

impl ControllerStateMachine {
    pub const fn new() -> Self {
        Self {
            state: ControllerState::Uninitialized,
        }
    }

    #[inline]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: ControllerEvent) -> TransitionResult {
        use ControllerEvent::*;
        use ControllerState::*;

        let next = match (self.state, event) {
            (_, Start) => Started,
            (Started, Cycle) | (Running, Cycle) => Running,
            (Uninitialized, Cycle) => {
                return TransitionResult::Rejected("Uninitialized: start() must run before update()");
            }
        };

        self.state = next;
        TransitionResult::Ok(next)
    }

    /// True once `start()` has run.
    #[inline]
    pub const fn is_started(&self) -> bool {
        !matches!(self.state, ControllerState::Uninitialized)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
