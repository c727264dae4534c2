//! Graceful and forced termination control.

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::error::{DebugError, UnwindSignal};
use crate::types::ThreadId;

/// Lifecycle of the traced program's termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationState {
    /// Normal execution.
    Running,
    /// A graceful quit was granted; the unwind signal is propagating.
    Quitting,
    /// A forced kill was requested.
    KillRequested,
    /// The traced program has finished unwinding.
    Terminated,
}

/// Decides graceful vs. forced termination based on thread count.
///
/// A graceful quit unwinds the traced program's call stack with an
/// [`UnwindSignal`]; that only works when the primary thread is the sole
/// active thread, since a signal raised in one thread cannot stop
/// independently scheduled threads.
#[derive(Debug)]
pub struct TerminationController {
    state: TerminationState,
    execution_status: Option<SmolStr>,
}

impl TerminationController {
    /// Create a controller in the running state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: TerminationState::Running,
            execution_status: None,
        }
    }

    /// Current termination state.
    #[must_use]
    pub fn state(&self) -> TerminationState {
        self.state
    }

    /// Whether a quit or kill is in progress.
    #[must_use]
    pub fn is_terminating(&self) -> bool {
        matches!(
            self.state,
            TerminationState::Quitting | TerminationState::KillRequested
        )
    }

    /// Request a graceful quit.
    ///
    /// Grants the quit and returns the signal to raise when the primary
    /// thread is the only active one; otherwise the state is unchanged.
    ///
    /// # Errors
    /// `DebugError::ThreadSafety` with a pointer at forced termination when
    /// other threads are still active.
    pub fn request_graceful(
        &mut self,
        active_threads: &[ThreadId],
        primary: ThreadId,
    ) -> Result<UnwindSignal, DebugError> {
        if active_threads.len() != 1 || active_threads[0] != primary {
            return Err(DebugError::ThreadSafety(SmolStr::new(format!(
                "graceful quit needs a single thread but {} are active; use kill to force termination",
                active_threads.len()
            ))));
        }
        self.state = TerminationState::Quitting;
        let status = SmolStr::new("Quit command");
        self.execution_status = Some(status.clone());
        Ok(UnwindSignal { status })
    }

    /// Request forced termination. Always permitted.
    pub fn request_kill(&mut self) {
        self.state = TerminationState::KillRequested;
        self.execution_status = Some(SmolStr::new("Killed"));
    }

    /// Record that the traced program finished unwinding.
    pub fn mark_terminated(&mut self) {
        self.state = TerminationState::Terminated;
    }

    /// Execution status recorded when termination was requested.
    #[must_use]
    pub fn execution_status(&self) -> Option<&str> {
        self.execution_status.as_deref()
    }

    /// The signal carrying the recorded execution status.
    pub(crate) fn signal(&self) -> UnwindSignal {
        UnwindSignal {
            status: self
                .execution_status
                .clone()
                .unwrap_or_else(|| SmolStr::new("Terminated")),
        }
    }
}

impl Default for TerminationController {
    fn default() -> Self {
        Self::new()
    }
}
