//! Condition evaluation capability.

use crate::error::EvalError;
use crate::types::Frame;

/// Evaluate a boolean expression in a frame's scope.
///
/// The core is scope-agnostic: everything it needs from an expression
/// evaluator is this one operation. Hosts plug in their own; tests use
/// closures.
pub trait ConditionEvaluator {
    /// Evaluate `expr` in the scope of `frame`, yielding its truth value.
    fn eval_condition(&mut self, expr: &str, frame: &Frame) -> Result<bool, EvalError>;
}

/// Evaluator for hosts without expression support; every condition errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvaluator;

impl ConditionEvaluator for NullEvaluator {
    fn eval_condition(&mut self, _expr: &str, _frame: &Frame) -> Result<bool, EvalError> {
        Err(EvalError::new("no condition evaluator installed"))
    }
}

impl<F> ConditionEvaluator for F
where
    F: FnMut(&str, &Frame) -> Result<bool, EvalError>,
{
    fn eval_condition(&mut self, expr: &str, frame: &Frame) -> Result<bool, EvalError> {
        self(expr, frame)
    }
}
