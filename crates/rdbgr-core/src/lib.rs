//! `rdbgr-core` - execution-control core for a source-level debugger.
//!
//! Tracks breakpoints, decides on every trace event whether to suspend the
//! traced program, and implements the step/next/continue/finish granularity
//! layered onto the raw event stream. Command parsing, help text, and the
//! interactive I/O surface live outside this crate; they drive the core
//! through [`DebugControl`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Breakpoint records, numbering, and event-time matching.
pub mod breakpoints;
/// Trace dispatch and session control.
pub mod control;
/// Core error taxonomy and the unwind signal.
pub mod error;
/// Condition evaluation capability.
pub mod eval;
/// Trace hook trait for execution hosts.
pub mod hook;
/// Debugger settings snapshot.
pub mod settings;
/// Stepping policy and step-argument parsing.
pub mod step;
/// Graceful and forced termination control.
pub mod termination;
mod trace;
/// Trace event and frame types.
pub mod types;

pub use breakpoints::{Breakpoint, BreakpointManager, BreakpointSpec};
pub use control::{DebugControl, DebugMode};
pub use error::{DebugError, EvalError, UnwindSignal};
pub use eval::{ConditionEvaluator, NullEvaluator};
pub use hook::{NoopTraceHook, TraceHook};
pub use settings::DebugSettings;
pub use step::{parse_step_args, StepController, StepOutcome, StepRequest};
pub use termination::{TerminationController, TerminationState};
pub use types::{
    ActivationId, DebugStop, EventKind, Frame, StopReason, ThreadId, TraceEvent,
};
