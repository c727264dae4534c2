//! Trace dispatch and session control.

#![allow(missing_docs)]

use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex};

use rustc_hash::FxHashMap;

use crate::breakpoints::{evaluate_breakpoints, BreakpointManager};
use crate::error::{DebugError, UnwindSignal};
use crate::eval::{ConditionEvaluator, NullEvaluator};
use crate::hook::TraceHook;
use crate::step::{StepController, StepOutcome, StepRequest};
use crate::termination::{TerminationController, TerminationState};
use crate::trace::{trace_debug, trace_stop};
use crate::types::{DebugStop, Frame, StopReason, ThreadId, TraceEvent};

/// Execution mode of the traced program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugMode {
    /// Events are dispatched without suspending.
    Running,
    /// A thread is suspended inside the dispatcher.
    Paused,
}

#[derive(Debug)]
struct SessionState {
    mode: DebugMode,
    breakpoints: BreakpointManager,
    steps: FxHashMap<ThreadId, StepController>,
    termination: TerminationController,
    target_thread: Option<ThreadId>,
    active_threads: Vec<ThreadId>,
    primary_thread: ThreadId,
    pending_pause: bool,
    stops: Vec<DebugStop>,
    last_stop: Option<DebugStop>,
    stop_tx: Option<Sender<DebugStop>>,
}

/// Shared session handle combining the trace dispatcher with the surface
/// the command loop mutates.
///
/// The host invokes [`DebugControl::dispatch`] synchronously on the traced
/// program's own thread for every event. On a stop, that thread blocks
/// inside the dispatcher until the command loop yields a resume decision;
/// breakpoint and step state are only mutated during that window, so the
/// single mutex sees no contention between mutation and dispatch.
#[derive(Debug, Clone)]
pub struct DebugControl {
    state: Arc<(Mutex<SessionState>, Condvar)>,
}

impl DebugControl {
    /// Create a session for a traced program whose primary thread is known.
    #[must_use]
    pub fn new(primary: ThreadId) -> Self {
        Self {
            state: Arc::new((
                Mutex::new(SessionState {
                    mode: DebugMode::Running,
                    breakpoints: BreakpointManager::new(),
                    steps: FxHashMap::default(),
                    termination: TerminationController::new(),
                    target_thread: None,
                    active_threads: vec![primary],
                    primary_thread: primary,
                    pending_pause: false,
                    stops: Vec::new(),
                    last_stop: None,
                    stop_tx: None,
                }),
                Condvar::new(),
            )),
        }
    }

    /// Dispatch one trace event, suspending the calling thread on a stop.
    ///
    /// # Errors
    /// [`UnwindSignal`] once termination has been granted; the traced
    /// program is expected to let it propagate.
    pub fn dispatch(
        &self,
        event: &TraceEvent,
        evaluator: &mut dyn ConditionEvaluator,
    ) -> Result<(), UnwindSignal> {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().expect("debug state poisoned");
        if state.termination.is_terminating() {
            return Err(state.termination.signal());
        }
        let thread = event.frame.thread;

        let mut reason = None;
        if state.pending_pause {
            state.pending_pause = false;
            reason = Some(StopReason::Pause);
        }
        if reason.is_none() && state.target_thread.is_none_or(|target| target == thread) {
            if let Some(controller) = state.steps.get_mut(&thread) {
                if let StepOutcome::Stop { finish } = controller.check(event) {
                    reason = Some(if finish {
                        StopReason::Finish
                    } else {
                        StopReason::Step
                    });
                    state.steps.remove(&thread);
                    state.target_thread = None;
                }
            }
        }
        if reason.is_none() {
            if let Some(id) = evaluate_breakpoints(&mut state.breakpoints, event, evaluator) {
                // A breakpoint stop cancels stepping everywhere.
                state.steps.clear();
                state.target_thread = None;
                reason = Some(StopReason::Breakpoint(id));
            }
        }
        let Some(reason) = reason else {
            return Ok(());
        };

        state.mode = DebugMode::Paused;
        emit_stop(&mut state, reason, &event.frame);

        // Resumption is driven by the shared mode so that every suspended
        // thread re-evaluates it; a one-shot token would only ever release
        // the first waiter.
        loop {
            if state.termination.is_terminating() {
                state.mode = DebugMode::Running;
                return Err(state.termination.signal());
            }
            if matches!(state.mode, DebugMode::Running) {
                return Ok(());
            }
            state = cvar.wait(state).expect("debug state poisoned");
        }
    }

    /// Resume execution with no stepping installed (run to the next
    /// breakpoint). Releases every suspended thread.
    pub fn continue_run(&self) {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().expect("debug state poisoned");
        state.steps.clear();
        state.target_thread = None;
        state.mode = DebugMode::Running;
        cvar.notify_all();
    }

    /// Install a step request for one thread and resume.
    ///
    /// The request's reference line is captured from `frame` (the frame the
    /// command loop is stopped in). Events on other threads never satisfy
    /// the request.
    pub fn install_step(&self, thread: ThreadId, request: StepRequest, frame: Option<&Frame>) {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().expect("debug state poisoned");
        state.steps.clear();
        let controller = state.steps.entry(thread).or_default();
        controller.install(request, frame);
        state.target_thread = Some(thread);
        state.mode = DebugMode::Running;
        cvar.notify_all();
    }

    /// Request a pause at the next dispatched event.
    pub fn pause(&self) {
        let (lock, _) = &*self.state;
        let mut state = lock.lock().expect("debug state poisoned");
        state.pending_pause = true;
    }

    /// Request a graceful quit of the traced program.
    ///
    /// On success the suspended thread resumes by raising the unwind signal
    /// out of the dispatcher.
    ///
    /// # Errors
    /// `DebugError::ThreadSafety` when more than the primary thread is
    /// active; execution continues and no state changes.
    pub fn quit(&self) -> Result<(), DebugError> {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().expect("debug state poisoned");
        let s = &mut *state;
        let signal = s
            .termination
            .request_graceful(&s.active_threads, s.primary_thread)?;
        trace_debug(&format!("graceful quit granted: {}", signal.status));
        cvar.notify_all();
        Ok(())
    }

    /// Request forced termination. Every thread's next dispatched event
    /// raises the unwind signal.
    pub fn kill(&self) {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().expect("debug state poisoned");
        state.termination.request_kill();
        cvar.notify_all();
    }

    /// Record that the traced program finished unwinding.
    pub fn mark_terminated(&self) {
        let (lock, _) = &*self.state;
        let mut state = lock.lock().expect("debug state poisoned");
        state.termination.mark_terminated();
    }

    /// Current termination state.
    #[must_use]
    pub fn termination_state(&self) -> TerminationState {
        let (lock, _) = &*self.state;
        let state = lock.lock().expect("debug state poisoned");
        state.termination.state()
    }

    /// Execution status recorded when termination was requested.
    #[must_use]
    pub fn execution_status(&self) -> Option<String> {
        let (lock, _) = &*self.state;
        let state = lock.lock().expect("debug state poisoned");
        state.termination.execution_status().map(str::to_owned)
    }

    /// Run a closure against the breakpoint table.
    ///
    /// Commands call this while the traced program is suspended; mutation
    /// and dispatch are never concurrent under that discipline.
    pub fn with_breakpoints<T>(&self, f: impl FnOnce(&mut BreakpointManager) -> T) -> T {
        let (lock, _) = &*self.state;
        let mut state = lock.lock().expect("debug state poisoned");
        f(&mut state.breakpoints)
    }

    /// Record a newly started execution thread.
    pub fn register_thread(&self, thread: ThreadId) {
        let (lock, _) = &*self.state;
        let mut state = lock.lock().expect("debug state poisoned");
        if !state.active_threads.contains(&thread) {
            state.active_threads.push(thread);
        }
    }

    /// Record that an execution thread finished.
    pub fn deregister_thread(&self, thread: ThreadId) {
        let (lock, _) = &*self.state;
        let mut state = lock.lock().expect("debug state poisoned");
        state.active_threads.retain(|active| *active != thread);
        state.steps.remove(&thread);
    }

    /// Snapshot of the active execution threads.
    #[must_use]
    pub fn active_threads(&self) -> Vec<ThreadId> {
        let (lock, _) = &*self.state;
        let state = lock.lock().expect("debug state poisoned");
        state.active_threads.clone()
    }

    /// Whether a thread is currently suspended inside the dispatcher.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        let (lock, _) = &*self.state;
        let state = lock.lock().expect("debug state poisoned");
        matches!(state.mode, DebugMode::Paused)
    }

    /// Current execution mode.
    #[must_use]
    pub fn mode(&self) -> DebugMode {
        let (lock, _) = &*self.state;
        let state = lock.lock().expect("debug state poisoned");
        state.mode
    }

    /// Stream stop notifications to a sender instead of buffering.
    pub fn set_stop_sender(&self, sender: Sender<DebugStop>) {
        let (lock, _) = &*self.state;
        let mut state = lock.lock().expect("debug state poisoned");
        state.stop_tx = Some(sender);
    }

    /// Drain buffered stop notifications.
    #[must_use]
    pub fn drain_stops(&self) -> Vec<DebugStop> {
        let (lock, _) = &*self.state;
        let mut state = lock.lock().expect("debug state poisoned");
        std::mem::take(&mut state.stops)
    }

    /// The most recent stop, if any.
    #[must_use]
    pub fn last_stop(&self) -> Option<DebugStop> {
        let (lock, _) = &*self.state;
        let state = lock.lock().expect("debug state poisoned");
        state.last_stop.clone()
    }
}

impl TraceHook for DebugControl {
    fn on_event(&mut self, event: &TraceEvent) -> Result<(), UnwindSignal> {
        self.dispatch(event, &mut NullEvaluator)
    }

    fn on_event_with_evaluator(
        &mut self,
        evaluator: &mut dyn ConditionEvaluator,
        event: &TraceEvent,
    ) -> Result<(), UnwindSignal> {
        self.dispatch(event, evaluator)
    }
}

fn emit_stop(state: &mut SessionState, reason: StopReason, frame: &Frame) {
    trace_stop(reason, frame);
    let stop = DebugStop {
        reason,
        function: frame.function.clone(),
        file: frame.file.clone(),
        line: frame.line,
        thread: frame.thread,
    };
    if let Some(sender) = &state.stop_tx {
        let _ = sender.send(stop.clone());
    }
    state.last_stop = Some(stop.clone());
    state.stops.push(stop);
}
