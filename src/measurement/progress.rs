//! Progress snapshot types.
//!
//! A [`ProgressState`] is built whole for every transition and published
//! by replacing the previous one, so readers never see a half-updated
//! state.

use crate::errors::{ErrorKind, MeasurementError};
use serde::Serialize;

/// Lifecycle status of the measurement service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// No measurement has run yet.
    Ready,
    /// A measurement is running.
    Testing,
    /// The last measurement completed successfully.
    Completed,
    /// The last measurement failed.
    Error,
}

/// Phases of a single measurement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestPhase {
    Idle,
    Initializing,
    FindingServer,
    ServerFound,
    TestingDownload,
    TestingUpload,
    Completed,
    Error,
}

impl TestPhase {
    /// Progress percentage reported while in this phase.
    pub fn progress(&self) -> u8 {
        match self {
            TestPhase::Idle => 0,
            TestPhase::Initializing => 10,
            TestPhase::FindingServer => 20,
            TestPhase::ServerFound => 30,
            TestPhase::TestingDownload => 40,
            TestPhase::TestingUpload => 70,
            TestPhase::Completed => 100,
            TestPhase::Error => 0,
        }
    }
}

/// Snapshot of the orchestrator's current status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressState {
    pub status: TestStatus,
    pub message: String,
    /// 0 to 100.
    pub progress: u8,
    #[serde(rename = "current_phase")]
    pub phase: TestPhase,
    /// Why the last run failed; only set when `status` is `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ProgressState {
    /// The state before any measurement has been requested.
    pub fn ready() -> Self {
        Self {
            status: TestStatus::Ready,
            message: "Ready to test".to_string(),
            progress: TestPhase::Idle.progress(),
            phase: TestPhase::Idle,
            error_kind: None,
        }
    }

    /// An in-flight phase. Progress is derived from the phase.
    pub fn testing(phase: TestPhase, message: impl Into<String>) -> Self {
        Self {
            status: TestStatus::Testing,
            message: message.into(),
            progress: phase.progress(),
            phase,
            error_kind: None,
        }
    }

    pub fn completed() -> Self {
        Self {
            status: TestStatus::Completed,
            message: "Test completed successfully".to_string(),
            progress: 100,
            phase: TestPhase::Completed,
            error_kind: None,
        }
    }

    pub fn failed(error: &MeasurementError) -> Self {
        Self {
            status: TestStatus::Error,
            message: format!("Speed test failed: {}", error.message),
            progress: 0,
            phase: TestPhase::Error,
            error_kind: Some(error.kind),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TestStatus::Completed | TestStatus::Error)
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::ready()
    }
}
