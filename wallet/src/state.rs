//! Session and exchange state definitions.

/// Session operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session is built but the rate poller is not running yet.
    Created,
    /// Rate poller is running and exchanges are accepted.
    Running,
    /// Session is closed; the rate poller has been stopped.
    Closed,
}

impl SessionState {
    /// Check if the session accepts exchanges.
    pub fn accepts_exchanges(&self) -> bool {
        !matches!(self, SessionState::Closed)
    }

    /// Check if the session is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed)
    }
}

/// Progress of the exchange currently being composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    /// Inputs are being edited and the preview follows them.
    Previewing,
    /// Submit in progress.
    Submitting,
    /// Last submit was applied to the ledger.
    Completed,
    /// Last submit was turned down.
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state() {
        assert!(SessionState::Created.accepts_exchanges());
        assert!(SessionState::Running.accepts_exchanges());
        assert!(!SessionState::Closed.accepts_exchanges());
        assert!(SessionState::Closed.is_terminal());
    }
}
