//! Debugger core errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

/// Recoverable errors reported to the command layer.
///
/// None of these corrupt breakpoint or step state; the failing command is
/// aborted and execution continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebugError {
    /// Malformed step or breakpoint arguments.
    #[error("invalid argument: {0}")]
    Argument(SmolStr),

    /// Unknown, out-of-range, or already-deleted breakpoint id.
    #[error("{0}")]
    Lookup(SmolStr),

    /// A breakpoint condition failed to evaluate.
    #[error("condition evaluation failed: {0}")]
    ConditionEvaluation(SmolStr),

    /// Graceful quit refused because more than one thread is active.
    #[error("{0}")]
    ThreadSafety(SmolStr),
}

/// Intentional control transfer used for graceful termination.
///
/// Raised through the traced program's call stack and expected to be caught
/// by its outer driver; it is never recovered inside the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("debugger quit: {status}")]
pub struct UnwindSignal {
    /// Execution status recorded when termination was requested.
    pub status: SmolStr,
}

/// Failure of the narrow condition-evaluation capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EvalError(pub SmolStr);

impl EvalError {
    /// Build an evaluation error from any message.
    pub fn new(message: impl AsRef<str>) -> Self {
        Self(SmolStr::new(message))
    }
}
