use std::fmt;

use serde::Serialize;

/// Session lifecycle. One explicit value owned by the sequencer; every
/// other component observes it, nothing else mutates it.
///
/// `Failed` is absorbing: it is reachable from `Preloading` and
/// `AwaitingStart` (asset load failure, microphone denial) and from
/// `Running` (capture or playback failure), and no transition leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingOrder,
    Preloading,
    AwaitingStart,
    Running,
    Complete,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Complete | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingOrder => "awaiting-order",
            SessionState::Preloading => "preloading",
            SessionState::AwaitingStart => "awaiting-start",
            SessionState::Running => "running",
            SessionState::Complete => "complete",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_complete_and_failed_are_terminal() {
        assert!(SessionState::Complete.is_terminal());
        assert!(SessionState::Failed.is_terminal());
        assert!(!SessionState::Idle.is_terminal());
        assert!(!SessionState::Running.is_terminal());
        assert!(!SessionState::AwaitingStart.is_terminal());
    }
}
