//! Trace hook trait.

#![allow(missing_docs)]

use crate::error::UnwindSignal;
use crate::eval::ConditionEvaluator;
use crate::types::TraceEvent;

/// Synchronous hook invoked by the execution host on every trace event.
pub trait TraceHook {
    /// Called for every event, on the traced program's own thread.
    ///
    /// # Errors
    /// [`UnwindSignal`] when the debugger has requested termination; the
    /// host lets it propagate through the traced program's stack.
    fn on_event(&mut self, event: &TraceEvent) -> Result<(), UnwindSignal>;

    /// Like [`TraceHook::on_event`], with a condition evaluator for the
    /// event's scope.
    ///
    /// # Errors
    /// See [`TraceHook::on_event`].
    fn on_event_with_evaluator(
        &mut self,
        evaluator: &mut dyn ConditionEvaluator,
        event: &TraceEvent,
    ) -> Result<(), UnwindSignal> {
        let _ = evaluator;
        self.on_event(event)
    }
}

/// No-op trace hook.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTraceHook;

impl TraceHook for NoopTraceHook {
    fn on_event(&mut self, _event: &TraceEvent) -> Result<(), UnwindSignal> {
        Ok(())
    }
}
