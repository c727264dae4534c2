//! Breakpoint records, numbering, and event-time matching.

#![allow(missing_docs)]

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::warn;

use crate::error::DebugError;
use crate::eval::ConditionEvaluator;
use crate::types::{ActivationId, Frame, TraceEvent};

/// Requested breakpoint location and flags.
#[derive(Debug, Clone, Default)]
pub struct BreakpointSpec {
    /// Function-name binding, if any.
    pub function: Option<SmolStr>,
    /// Source file for a line binding.
    pub file: Option<SmolStr>,
    /// Source line for a line binding.
    pub line: Option<u32>,
    /// Optional condition, evaluated in the stopped frame's scope.
    pub condition: Option<SmolStr>,
    /// Delete after the first successful stop.
    pub temporary: bool,
}

impl BreakpointSpec {
    /// Spec for an entry-only breakpoint on a function.
    #[must_use]
    pub fn function(name: impl Into<SmolStr>) -> Self {
        Self {
            function: Some(name.into()),
            ..Self::default()
        }
    }

    /// Spec for a line breakpoint.
    #[must_use]
    pub fn line(file: impl Into<SmolStr>, line: u32) -> Self {
        Self {
            file: Some(file.into()),
            line: Some(line),
            ..Self::default()
        }
    }

    /// Attach a condition expression.
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<SmolStr>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Mark as temporary (one-shot).
    #[must_use]
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }
}

/// One breakpoint record.
#[derive(Debug, Clone)]
pub struct Breakpoint {
    /// Positive id, monotonically assigned, never reused.
    pub id: u32,
    /// Function-name binding, if any.
    pub function: Option<SmolStr>,
    /// Source file for a line binding.
    pub file: Option<SmolStr>,
    /// Source line for a line binding.
    pub line: Option<u32>,
    /// Optional condition expression.
    pub condition: Option<SmolStr>,
    /// Deleted after the first successful stop.
    pub temporary: bool,
    /// Disabled breakpoints are skipped during matching.
    pub enabled: bool,
    /// Number of location matches seen so far.
    pub hits: u64,
    /// Activation of the most recent successful entry-only match, used to
    /// suppress duplicate stops within one call.
    last_activation: Option<ActivationId>,
}

impl Breakpoint {
    /// User-facing location: the bound function, or `file:line`.
    #[must_use]
    pub fn location(&self) -> String {
        match (&self.function, &self.file, self.line) {
            (Some(function), _, None) => function.to_string(),
            (_, Some(file), Some(line)) => format!("{file}:{line}"),
            // Unreachable after add-time validation; render what we have.
            (Some(function), _, Some(line)) => format!("{function}:{line}"),
            (None, _, _) => String::new(),
        }
    }

    fn is_entry_only(&self) -> bool {
        self.function.is_some() && self.line.is_none()
    }
}

#[derive(Debug, Clone)]
enum BreakpointSlot {
    Active(Breakpoint),
    Tombstone,
}

/// Owns breakpoint records, numbering, and lookup for one debug session.
///
/// Deleted ids are retained as tombstones so later operations can report
/// "previously deleted" rather than "unknown".
#[derive(Debug, Default)]
pub struct BreakpointManager {
    slots: IndexMap<u32, BreakpointSlot>,
    last_id: u32,
    by_line: FxHashMap<(SmolStr, u32), Vec<u32>>,
    by_function: FxHashMap<SmolStr, Vec<u32>>,
}

impl BreakpointManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a breakpoint, assigning the next id.
    ///
    /// # Errors
    /// `DebugError::Argument` when the spec carries no usable location.
    pub fn add_breakpoint(&mut self, spec: BreakpointSpec) -> Result<&Breakpoint, DebugError> {
        if spec.line.is_some() && spec.file.is_none() {
            return Err(DebugError::Argument(SmolStr::new(
                "line breakpoint requires a file",
            )));
        }
        if spec.function.is_none() && spec.line.is_none() {
            return Err(DebugError::Argument(SmolStr::new(
                "breakpoint location requires a function or file:line",
            )));
        }
        let id = self.last_id + 1;
        self.last_id = id;
        let breakpoint = Breakpoint {
            id,
            function: spec.function,
            file: spec.file,
            line: spec.line,
            condition: spec.condition,
            temporary: spec.temporary,
            enabled: true,
            hits: 0,
            last_activation: None,
        };
        self.index(&breakpoint);
        self.slots.insert(id, BreakpointSlot::Active(breakpoint));
        match self.slots.get(&id) {
            Some(BreakpointSlot::Active(bp)) => Ok(bp),
            _ => unreachable!("breakpoint {id} just inserted"),
        }
    }

    /// Enable a breakpoint.
    ///
    /// # Errors
    /// `DebugError::Lookup` for unknown or deleted ids.
    pub fn enable(&mut self, id: u32) -> Result<(), DebugError> {
        self.set_enabled(id, true)
    }

    /// Disable a breakpoint without deleting it.
    ///
    /// # Errors
    /// `DebugError::Lookup` for unknown or deleted ids.
    pub fn disable(&mut self, id: u32) -> Result<(), DebugError> {
        self.set_enabled(id, false)
    }

    fn set_enabled(&mut self, id: u32, enabled: bool) -> Result<(), DebugError> {
        match self.slots.get_mut(&id) {
            Some(BreakpointSlot::Active(bp)) => {
                bp.enabled = enabled;
                Ok(())
            }
            Some(BreakpointSlot::Tombstone) => Err(DebugError::Lookup(SmolStr::new(format!(
                "Breakpoint ({id}) previously deleted."
            )))),
            None => Err(DebugError::Lookup(SmolStr::new(format!(
                "No breakpoint numbered {id}."
            )))),
        }
    }

    /// Delete a breakpoint by number, leaving a tombstone behind.
    ///
    /// Returns `(success, message)`; the message is empty on success and
    /// explains the failure otherwise.
    pub fn delete_breakpoint_by_number(&mut self, id: u32) -> (bool, String) {
        if id == 0 || id > self.last_id {
            return (
                false,
                format!("Breakpoint number ({id}) out of range 1.{}.", self.last_id),
            );
        }
        match self.slots.get(&id) {
            Some(BreakpointSlot::Active(_)) => {
                self.unindex(id);
                self.slots.insert(id, BreakpointSlot::Tombstone);
                (true, String::new())
            }
            _ => (false, format!("Breakpoint ({id}) previously deleted.")),
        }
    }

    /// Highest id ever assigned; 0 when none. Deletion never lowers this.
    #[must_use]
    pub fn last(&self) -> u32 {
        self.last_id
    }

    /// Look up an active breakpoint.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Breakpoint> {
        match self.slots.get(&id) {
            Some(BreakpointSlot::Active(bp)) => Some(bp),
            _ => None,
        }
    }

    /// Active breakpoints in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
        self.slots.values().filter_map(|slot| match slot {
            BreakpointSlot::Active(bp) => Some(bp),
            BreakpointSlot::Tombstone => None,
        })
    }

    /// Number of active (non-tombstoned) breakpoints.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.iter().count()
    }

    /// Clear all breakpoints and restart numbering from 1.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.by_line.clear();
        self.by_function.clear();
        self.last_id = 0;
    }

    /// Render a breakpoint for listings. `keep yes`/`keep no` mirrors the
    /// enabled flag; the output depends only on the record itself.
    #[must_use]
    pub fn render(bp: &Breakpoint) -> String {
        let keep = if bp.enabled { "yes" } else { "no" };
        format!(
            "{}   breakpoint   keep {}   at {}",
            bp.id,
            keep,
            bp.location()
        )
    }

    fn index(&mut self, bp: &Breakpoint) {
        if let (Some(file), Some(line)) = (&bp.file, bp.line) {
            self.by_line
                .entry((file.clone(), line))
                .or_default()
                .push(bp.id);
        } else if let Some(function) = &bp.function {
            self.by_function
                .entry(function.clone())
                .or_default()
                .push(bp.id);
        }
    }

    fn unindex(&mut self, id: u32) {
        for ids in self.by_line.values_mut() {
            ids.retain(|candidate| *candidate != id);
        }
        for ids in self.by_function.values_mut() {
            ids.retain(|candidate| *candidate != id);
        }
    }

    fn candidates(&self, frame: &Frame) -> Vec<u32> {
        let mut ids = Vec::new();
        if let Some(entry) = self.by_function.get(&frame.function) {
            ids.extend_from_slice(entry);
        }
        if let Some(entry) = self.by_line.get(&(frame.file.clone(), frame.line)) {
            ids.extend_from_slice(entry);
        }
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Decide whether one breakpoint fires for a frame.
///
/// Entry-only breakpoints fire once per call activation: a successful match
/// records the activation, suppressing later events within the same call
/// while letting a new activation (recursive re-entry included) match again.
/// Line breakpoints fire on every visit to their location.
pub(crate) fn matches_breakpoint(
    bp: &mut Breakpoint,
    frame: &Frame,
    evaluator: &mut dyn ConditionEvaluator,
) -> bool {
    if bp.is_entry_only() {
        if bp.function.as_ref() != Some(&frame.function) {
            return false;
        }
        if bp.last_activation == Some(frame.activation) {
            return false;
        }
    } else {
        if bp.line != Some(frame.line) {
            return false;
        }
        if bp.file.as_ref() != Some(&frame.file) {
            return false;
        }
        if let Some(function) = &bp.function {
            if *function != frame.function {
                return false;
            }
        }
    }
    bp.hits = bp.hits.saturating_add(1);
    if let Some(condition) = &bp.condition {
        match evaluator.eval_condition(condition, frame) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(err) => {
                warn!("breakpoint {} condition failed: {err}", bp.id);
                return false;
            }
        }
    }
    if bp.is_entry_only() {
        bp.last_activation = Some(frame.activation);
    }
    true
}

/// Scan enabled breakpoints in ascending id order and return the first that
/// fires for this event, if any.
///
/// A matched temporary breakpoint is tombstoned here, before the caller
/// decides what to do with the stop.
pub(crate) fn evaluate_breakpoints(
    manager: &mut BreakpointManager,
    event: &TraceEvent,
    evaluator: &mut dyn ConditionEvaluator,
) -> Option<u32> {
    let mut matched = None;
    for id in manager.candidates(&event.frame) {
        let Some(BreakpointSlot::Active(bp)) = manager.slots.get_mut(&id) else {
            continue;
        };
        if !bp.enabled {
            continue;
        }
        if matches_breakpoint(bp, &event.frame, evaluator) {
            matched = Some((id, bp.temporary));
            break;
        }
    }
    let (id, temporary) = matched?;
    if temporary {
        let _ = manager.delete_breakpoint_by_number(id);
    }
    Some(id)
}
