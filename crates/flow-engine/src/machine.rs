//! Per-invocation flow decisions.
//!
//! [`FlowStateMachine`] turns navigation events, cancellation and timer
//! expiry into state transitions and, on a terminal transition, into the one
//! outcome the caller receives. It owns no I/O; the engine feeds it and acts
//! on what it returns.

use crate::error::{AuthError, FlowResult};
use crate::flow_fsm::{FlowMachine, FlowMachineInput, FlowState, TransitionRejected};
use artifact_extractor::{is_failure, try_extract};
use auth_bridge_types::{AuthConfig, AuthResult, NavigationEvent, SessionArtifact};
use expiry_parser::{ExpiryParseError, ExpiryParser};
use std::sync::Arc;
use tracing::{debug, info};

/// Terminal outcome of a flow.
pub type FlowOutcome = FlowResult<AuthResult>;

pub struct FlowStateMachine {
    fsm: FlowMachine,
    config: Arc<AuthConfig>,
    parser: Arc<dyn ExpiryParser>,
    flow_id: String,
}

impl FlowStateMachine {
    pub fn new(
        flow_id: impl Into<String>,
        config: Arc<AuthConfig>,
        parser: Arc<dyn ExpiryParser>,
    ) -> Self {
        Self {
            fsm: FlowMachine::new(),
            config,
            parser,
            flow_id: flow_id.into(),
        }
    }

    pub fn state(&self) -> FlowState {
        FlowState::from(self.fsm.state())
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Idle → Loading.
    pub fn start(&mut self) -> Result<(), TransitionRejected> {
        self.transition(FlowMachineInput::Start).map(|_| ())
    }

    /// Feed one navigation event.
    ///
    /// Returns the outcome when the event ends the flow. Events that arrive
    /// once the flow is terminal, or before it started, are discarded.
    pub fn on_event(&mut self, event: &NavigationEvent) -> Option<FlowOutcome> {
        if !matches!(self.state(), FlowState::Loading | FlowState::AwaitingTerminal) {
            debug!(
                flow_id = %self.flow_id,
                state = ?self.state(),
                event = event.kind_name(),
                "Discarding event outside active flow"
            );
            return None;
        }

        // Failure markers are checked first so a URL matching both a success
        // and a failure pattern fails.
        if is_failure(event, &self.config) {
            return self.fail(AuthError::load_failed(format!(
                "failure page reached: {}",
                event.url()
            )));
        }

        if let NavigationEvent::LoadFailed { url, error_kind } = event {
            debug!(
                flow_id = %self.flow_id,
                url = %url,
                error_kind = %error_kind,
                "Page failed to load"
            );
            return self.fail(AuthError::load_failed(error_kind.clone()));
        }

        match try_extract(event, &self.config) {
            Some(artifact) => Some(self.accept(artifact)),
            None => {
                self.transition(FlowMachineInput::Navigated).ok()?;
                None
            }
        }
    }

    /// Caller cancellation. `None` if the flow already ended.
    pub fn cancel(&mut self) -> Option<AuthError> {
        self.transition(FlowMachineInput::CancelRequested)
            .ok()
            .map(|_| AuthError::Cancelled)
    }

    /// Timer expiry. `None` if the flow already ended.
    pub fn expire(&mut self) -> Option<AuthError> {
        self.transition(FlowMachineInput::TimerExpired)
            .ok()
            .map(|_| AuthError::TimedOut)
    }

    /// Fail the flow with `error`. `None` if the flow already ended.
    pub fn fail(&mut self, error: AuthError) -> Option<FlowOutcome> {
        self.transition(FlowMachineInput::FlowFailed).ok()?;
        info!(flow_id = %self.flow_id, error = %error, "Auth flow failed");
        Some(Err(error))
    }

    fn accept(&mut self, artifact: SessionArtifact) -> FlowOutcome {
        let expires_at = match artifact.raw_expiry.as_deref().map(|raw| self.parser.parse(raw)) {
            Some(Ok(expires_at)) => Some(expires_at),
            Some(Err(ExpiryParseError::Unparseable(raw))) => {
                return self.fail_terminal(AuthError::UnparseableExpiry(raw));
            }
            Some(Err(ExpiryParseError::Empty)) | None if self.config.expiry_required => {
                return self.fail_terminal(AuthError::MissingArtifact(format!(
                    "{} present but {} missing or empty",
                    artifact.cookie_name, self.config.expiry_field_name
                )));
            }
            Some(Err(ExpiryParseError::Empty)) | None => None,
        };

        if let Err(e) = self.transition(FlowMachineInput::ArtifactAccepted) {
            return Err(AuthError::load_failed(e.to_string()));
        }
        info!(
            flow_id = %self.flow_id,
            source_url = %artifact.source_url,
            expires_at = ?expires_at,
            "Auth flow resolved"
        );
        Ok(AuthResult::from_artifact(artifact, expires_at))
    }

    /// `fail` for callers that already checked the flow is active.
    fn fail_terminal(&mut self, error: AuthError) -> FlowOutcome {
        self.fail(error.clone()).unwrap_or(Err(error))
    }

    fn transition(&mut self, input: FlowMachineInput) -> Result<FlowState, TransitionRejected> {
        let old_state = self.state();
        self.fsm.consume(&input).map_err(|_| TransitionRejected {
            input: input.clone(),
            state: old_state,
        })?;

        let new_state = self.state();
        if old_state != new_state {
            debug!(
                flow_id = %self.flow_id,
                old_state = ?old_state,
                new_state = ?new_state,
                "Flow state transition"
            );
        }
        Ok(new_state)
    }
}
