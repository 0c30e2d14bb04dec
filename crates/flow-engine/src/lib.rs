//! Authentication flow orchestration.
//!
//! This crate provides:
//! - An explicit FSM for the flow lifecycle (`Idle` → `Loading` →
//!   `AwaitingTerminal` → `Resolved` | `Failed` | `Cancelled`)
//! - [`FlowStateMachine`], which turns navigation events into decisions
//! - [`AuthFlowEngine`], which runs one cancellable, timed flow per surface

mod engine;
mod error;
mod flow_fsm;
mod machine;

pub use engine::{AuthFlowEngine, FlowHandle, PendingAuth};
pub use error::{AuthError, FlowResult};
pub use flow_fsm::flow_machine;
pub use flow_fsm::{FlowMachine, FlowMachineInput, FlowMachineState, FlowState, TransitionRejected};
pub use machine::{FlowOutcome, FlowStateMachine};
