//! Authentication flow state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │      Idle       │ (initial)
//! └────────┬────────┘
//!          │ Start
//!          ▼
//! ┌─────────────────┐  Navigated   ┌──────────────────┐
//! │     Loading     │ ───────────► │ AwaitingTerminal │ ◄─┐ Navigated
//! └────────┬────────┘              └────────┬─────────┘ ──┘
//!          │                                │
//!          ├── ArtifactAccepted ──► Resolved ◄──┤
//!          ├── FlowFailed ────────► Failed ◄────┤
//!          └── CancelRequested /               │
//!              TimerExpired ──────► Cancelled ◄─┘
//! ```
//!
//! `Resolved`, `Failed` and `Cancelled` accept no input, so anything arriving
//! after a terminal transition is rejected by the machine itself.

use rust_fsm::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub flow_machine(Idle)

    Idle => {
        Start => Loading,
        CancelRequested => Cancelled
    },
    Loading => {
        Navigated => AwaitingTerminal,
        ArtifactAccepted => Resolved,
        FlowFailed => Failed,
        CancelRequested => Cancelled,
        TimerExpired => Cancelled
    },
    AwaitingTerminal => {
        Navigated => AwaitingTerminal,
        ArtifactAccepted => Resolved,
        FlowFailed => Failed,
        CancelRequested => Cancelled,
        TimerExpired => Cancelled
    }
}

pub use flow_machine::Input as FlowMachineInput;
pub use flow_machine::State as FlowMachineState;
pub use flow_machine::StateMachine as FlowMachine;

/// Flow state for logging and for callers polling a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    /// Created, entry URL not yet requested.
    Idle,
    /// Entry URL requested, nothing observed yet.
    Loading,
    /// At least one navigation observed, no terminal page yet.
    AwaitingTerminal,
    /// Artifact extracted and delivered.
    Resolved,
    /// Failure page, load failure, or unusable artifact.
    Failed,
    /// Cancelled by the caller or by the timeout.
    Cancelled,
}

impl FlowState {
    /// Returns true once the flow can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowState::Resolved | FlowState::Failed | FlowState::Cancelled
        )
    }
}

impl From<&FlowMachineState> for FlowState {
    fn from(state: &FlowMachineState) -> Self {
        match state {
            FlowMachineState::Idle => FlowState::Idle,
            FlowMachineState::Loading => FlowState::Loading,
            FlowMachineState::AwaitingTerminal => FlowState::AwaitingTerminal,
            FlowMachineState::Resolved => FlowState::Resolved,
            FlowMachineState::Failed => FlowState::Failed,
            FlowMachineState::Cancelled => FlowState::Cancelled,
        }
    }
}

/// An input the machine does not accept in its current state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot apply {input:?} in state {state:?}")]
pub struct TransitionRejected {
    pub input: FlowMachineInput,
    pub state: FlowState,
}
