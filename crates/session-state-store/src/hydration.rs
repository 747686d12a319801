//! Hydration phase state machine using rust-fsm.
//!
//! ```text
//!   Cold ──Consistent──► Ready
//!    │                    │  ▲
//!    │ StaleDetected      │  │ Healed
//!    ▼                    ▼  │
//!   Healing ◄──StaleDetected─┘
//! ```
//!
//! `Cold` is the state before the persisted subset has been loaded. The
//! store enters `Healing` whenever the current event is not in the events
//! list, and leaves it once a fresh events list (or a logout) makes the
//! state consistent again.

use rust_fsm::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub hydration_machine(Cold)

    Cold => {
        Consistent => Ready,
        StaleDetected => Healing
    },
    Healing => {
        StaleDetected => Healing,
        Healed => Ready
    },
    Ready => {
        StaleDetected => Healing
    }
}

pub use hydration_machine::Input as HydrationInput;
pub use hydration_machine::State as HydrationMachineState;
pub use hydration_machine::StateMachine as HydrationMachine;

/// Hydration phase as exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HydrationPhase {
    /// Persisted state not loaded yet.
    #[default]
    Cold,
    /// Stale event data is suppressed while a fresh events list loads.
    Healing,
    /// Dependent UI may render.
    Ready,
}

impl From<&HydrationMachineState> for HydrationPhase {
    fn from(state: &HydrationMachineState) -> Self {
        match state {
            HydrationMachineState::Cold => HydrationPhase::Cold,
            HydrationMachineState::Healing => HydrationPhase::Healing,
            HydrationMachineState::Ready => HydrationPhase::Ready,
        }
    }
}

impl From<HydrationPhase> for HydrationMachineState {
    fn from(phase: HydrationPhase) -> Self {
        match phase {
            HydrationPhase::Cold => HydrationMachineState::Cold,
            HydrationPhase::Healing => HydrationMachineState::Healing,
            HydrationPhase::Ready => HydrationMachineState::Ready,
        }
    }
}

impl HydrationPhase {
    /// Feed one input to the machine. Impossible transitions leave the
    /// phase unchanged and return false.
    pub fn advance(&mut self, input: HydrationInput) -> bool {
        let mut machine = HydrationMachine::from_state((*self).into());
        match machine.consume(&input) {
            Ok(_) => {
                *self = machine.state().into();
                true
            }
            Err(_) => {
                warn!(phase = ?self, input = ?input, "Ignoring impossible hydration transition");
                false
            }
        }
    }

    /// Move to `Ready` by whichever input applies from the current phase.
    pub fn settle(&mut self) {
        match self {
            HydrationPhase::Cold => {
                self.advance(HydrationInput::Consistent);
            }
            HydrationPhase::Healing => {
                self.advance(HydrationInput::Healed);
            }
            HydrationPhase::Ready => {}
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, HydrationPhase::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_cold() {
        let machine = HydrationMachine::new();
        assert_eq!(*machine.state(), HydrationMachineState::Cold);
        assert_eq!(HydrationPhase::default(), HydrationPhase::Cold);
    }

    #[test]
    fn test_consistent_rehydration_goes_ready() {
        let mut phase = HydrationPhase::Cold;
        assert!(phase.advance(HydrationInput::Consistent));
        assert_eq!(phase, HydrationPhase::Ready);
    }

    #[test]
    fn test_stale_rehydration_heals() {
        let mut phase = HydrationPhase::Cold;
        assert!(phase.advance(HydrationInput::StaleDetected));
        assert_eq!(phase, HydrationPhase::Healing);

        // A retry while healing stays healing
        assert!(phase.advance(HydrationInput::StaleDetected));
        assert_eq!(phase, HydrationPhase::Healing);

        assert!(phase.advance(HydrationInput::Healed));
        assert_eq!(phase, HydrationPhase::Ready);
    }

    #[test]
    fn test_ready_can_fall_back_to_healing() {
        let mut phase = HydrationPhase::Ready;
        assert!(phase.advance(HydrationInput::StaleDetected));
        assert_eq!(phase, HydrationPhase::Healing);
    }

    #[test]
    fn test_invalid_transitions_leave_phase() {
        let mut phase = HydrationPhase::Cold;
        assert!(!phase.advance(HydrationInput::Healed));
        assert_eq!(phase, HydrationPhase::Cold);

        let mut phase = HydrationPhase::Ready;
        assert!(!phase.advance(HydrationInput::Consistent));
        assert_eq!(phase, HydrationPhase::Ready);
    }

    #[test]
    fn test_settle_from_every_phase() {
        for start in [
            HydrationPhase::Cold,
            HydrationPhase::Healing,
            HydrationPhase::Ready,
        ] {
            let mut phase = start;
            phase.settle();
            assert!(phase.is_ready(), "{:?}", start);
        }
    }
}
