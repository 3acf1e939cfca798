use std::cell::Cell;

/// Lifecycle of a host's listen loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session has run yet, or the last one ended with a disconnect frame.
    #[default]
    Idle,
    /// Waiting for (or reading) the next frame.
    Listening,
    /// A message handler is running.
    Dispatching,
    /// The last session ended with an error or was dropped mid-flight.
    /// A new session may be started.
    Terminated,
}

impl SessionState {
    /// `true` while a listen loop owns the host.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Listening | SessionState::Dispatching)
    }
}

/// Per-host session slot. Only the loop driver, through [`SessionGuard`], changes it.
#[derive(Debug, Default)]
pub(crate) struct Session {
    state: Cell<SessionState>,
}

impl Session {
    pub(crate) fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Claim the slot for a new listen loop, or `None` if one is already active.
    pub(crate) fn begin(&self) -> Option<SessionGuard<'_>> {
        if self.state.get().is_active() {
            return None;
        }
        self.state.set(SessionState::Listening);
        Some(SessionGuard {
            session: self,
            exit_state: SessionState::Terminated,
        })
    }
}

/// Held by the running loop. Dropping it ends the session.
#[derive(Debug)]
pub(crate) struct SessionGuard<'a> {
    session: &'a Session,
    exit_state: SessionState,
}

impl SessionGuard<'_> {
    pub(crate) fn dispatching(&self) {
        self.session.state.set(SessionState::Dispatching);
    }

    pub(crate) fn listening(&self) {
        self.session.state.set(SessionState::Listening);
    }

    /// End the session normally (disconnect frame observed).
    pub(crate) fn disconnected(mut self) {
        self.exit_state = SessionState::Idle;
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.session.state.set(self.exit_state);
    }
}
