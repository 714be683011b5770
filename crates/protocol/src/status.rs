use serde::{Deserialize, Serialize};

/// Coarse externally visible run state for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run tracked for the file.
    #[default]
    Idle,
    /// A run is in flight; the published list is a checkpoint.
    Running,
    /// Last run finalized with exit code 0.
    Completed,
    /// Last run failed to spawn, exited non-zero, or timed out.
    Errored,
}

/// Run status surfaced to renderers alongside the diagnostic list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    /// Short human-readable detail (issue tally, exit status, failure text).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RunStatus {
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            state: RunState::Idle,
            detail: None,
        }
    }

    #[must_use]
    pub const fn running() -> Self {
        Self {
            state: RunState::Running,
            detail: None,
        }
    }

    #[must_use]
    pub fn completed(detail: impl Into<String>) -> Self {
        Self {
            state: RunState::Completed,
            detail: Some(detail.into()),
        }
    }

    #[must_use]
    pub fn errored(detail: impl Into<String>) -> Self {
        Self {
            state: RunState::Errored,
            detail: Some(detail.into()),
        }
    }
}
