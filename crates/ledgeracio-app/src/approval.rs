//! On-device approval state machine.
//!
//! ```text
//! Idle ──begin──▶ Reviewing ──Confirm on APPROVE──▶ Accepted ─┐
//!                    │  ▲                                       ├─▶ Idle
//!                    │  └─ Next / Previous                      │
//!                    └── Reject / Timeout / Confirm on REJECT ─▶ Rejected
//! ```
//!
//! The review pages are the operation's fields followed by an APPROVE page
//! and a REJECT page. Terminal decisions are handed back to the caller and
//! the machine drops back to `Idle` in the same step.

use ledgeracio_core::error::LedgeracioError;
use tracing::debug;

/// One field shown during review.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewStep {
    pub title: String,
    pub value: String,
}

impl ReviewStep {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self { title: title.into(), value: value.into() }
    }
}

/// Discrete UI inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiEvent {
    /// Right button.
    Next,
    /// Left button.
    Previous,
    /// Both buttons pressed together.
    Confirm,
    /// Explicit reject gesture.
    Reject,
    /// Review left unattended past the device timeout.
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Rejected,
}

/// What the display currently shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Field { index: usize, total: usize, step: ReviewStep },
    Approve,
    Reject,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Reviewing { steps: Vec<ReviewStep>, cursor: usize },
}

#[derive(Debug, Default)]
pub struct ApprovalStateMachine {
    state: State,
}

impl ApprovalStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// Start reviewing `steps`. Only allowed from `Idle`.
    pub fn begin(&mut self, steps: Vec<ReviewStep>) -> Result<(), LedgeracioError> {
        if !self.is_idle() {
            return Err(LedgeracioError::Busy);
        }
        debug!(steps = steps.len(), "review started");
        self.state = State::Reviewing { steps, cursor: 0 };
        Ok(())
    }

    pub fn screen(&self) -> Option<Screen> {
        match &self.state {
            State::Idle => None,
            State::Reviewing { steps, cursor } => Some(match *cursor {
                i if i < steps.len() => Screen::Field {
                    index: i,
                    total: steps.len(),
                    step: steps[i].clone(),
                },
                i if i == steps.len() => Screen::Approve,
                _ => Screen::Reject,
            }),
        }
    }

    /// Feed one input. Returns the decision once the review terminates.
    ///
    /// Inputs while `Idle` are ignored.
    pub fn handle(&mut self, event: UiEvent) -> Option<Decision> {
        let State::Reviewing { steps, cursor } = &mut self.state else {
            return None;
        };
        let approve_page = steps.len();
        let reject_page = steps.len() + 1;

        let decision = match event {
            UiEvent::Next => {
                *cursor = (*cursor + 1).min(reject_page);
                None
            }
            UiEvent::Previous => {
                *cursor = cursor.saturating_sub(1);
                None
            }
            UiEvent::Confirm if *cursor == approve_page => Some(Decision::Accepted),
            UiEvent::Confirm if *cursor == reject_page => Some(Decision::Rejected),
            UiEvent::Confirm => None,
            UiEvent::Reject | UiEvent::Timeout => Some(Decision::Rejected),
        };

        if let Some(d) = decision {
            debug!(decision = ?d, ?event, "review finished");
            self.state = State::Idle;
        }
        decision
    }
}
