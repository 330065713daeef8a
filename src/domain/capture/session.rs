//! Capture session state machine

use std::fmt;
use thiserror::Error;

/// Capture states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Recording,
    Stopping,
}

impl CaptureState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid capture transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: CaptureState,
    pub action: &'static str,
}

/// Microphone session lifecycle.
///
/// State machine:
///   IDLE -> RECORDING (begin)
///   RECORDING -> STOPPING (begin_stop)
///   STOPPING -> IDLE (finish)
///   RECORDING | STOPPING -> IDLE (abort)
#[derive(Debug, Default)]
pub struct CaptureSession {
    state: CaptureState,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == CaptureState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    fn transition(
        &mut self,
        from: &[CaptureState],
        to: CaptureState,
        action: &'static str,
    ) -> Result<(), InvalidStateTransition> {
        if !from.contains(&self.state) {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action,
            });
        }
        self.state = to;
        Ok(())
    }

    /// IDLE -> RECORDING
    pub fn begin(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(&[CaptureState::Idle], CaptureState::Recording, "start a session")
    }

    /// RECORDING -> STOPPING
    pub fn begin_stop(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[CaptureState::Recording],
            CaptureState::Stopping,
            "stop the session",
        )
    }

    /// STOPPING -> IDLE
    pub fn finish(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[CaptureState::Stopping],
            CaptureState::Idle,
            "finish the session",
        )
    }

    /// RECORDING | STOPPING -> IDLE
    pub fn abort(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[CaptureState::Recording, CaptureState::Stopping],
            CaptureState::Idle,
            "abort the session",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let session = CaptureSession::new();
        assert!(session.is_idle());
        assert_eq!(session.state(), CaptureState::Idle);
    }

    #[test]
    fn full_cycle_returns_to_idle() {
        let mut session = CaptureSession::new();
        session.begin().unwrap();
        assert!(session.is_recording());
        session.begin_stop().unwrap();
        assert_eq!(session.state(), CaptureState::Stopping);
        session.finish().unwrap();
        assert!(session.is_idle());

        session.begin().unwrap();
        assert!(session.is_recording());
    }

    #[test]
    fn begin_while_recording_fails() {
        let mut session = CaptureSession::new();
        session.begin().unwrap();

        let err = session.begin().unwrap_err();
        assert_eq!(err.current_state, CaptureState::Recording);
        assert_eq!(session.state(), CaptureState::Recording);
    }

    #[test]
    fn begin_while_stopping_fails() {
        let mut session = CaptureSession::new();
        session.begin().unwrap();
        session.begin_stop().unwrap();

        let err = session.begin().unwrap_err();
        assert_eq!(err.current_state, CaptureState::Stopping);
    }

    #[test]
    fn stop_from_idle_fails() {
        let mut session = CaptureSession::new();
        let err = session.begin_stop().unwrap_err();
        assert_eq!(err.current_state, CaptureState::Idle);
    }

    #[test]
    fn finish_requires_stopping() {
        let mut session = CaptureSession::new();
        session.begin().unwrap();
        assert!(session.finish().is_err());
    }

    #[test]
    fn abort_from_recording_and_stopping() {
        let mut session = CaptureSession::new();
        session.begin().unwrap();
        session.abort().unwrap();
        assert!(session.is_idle());

        session.begin().unwrap();
        session.begin_stop().unwrap();
        session.abort().unwrap();
        assert!(session.is_idle());

        assert!(session.abort().is_err());
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: CaptureState::Stopping,
            action: "start a session",
        };
        let msg = err.to_string();
        assert!(msg.contains("start a session"));
        assert!(msg.contains("stopping"));
    }
}
