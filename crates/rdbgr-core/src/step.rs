//! Stepping policy and step-argument parsing.

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::error::DebugError;
use crate::settings::DebugSettings;
use crate::types::{EventKind, Frame, TraceEvent};

/// One installed stepping policy.
///
/// Replaced wholesale by each step/next/continue/finish command and consumed
/// incrementally per event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepRequest {
    /// Event kinds that qualify; empty means any event.
    pub event_filter: Vec<EventKind>,
    /// Qualifying events to skip before stopping.
    pub ignore_count: u32,
    /// Refuse to stop while still on the reference line.
    pub require_different_line: bool,
    /// Stack-depth target; events in deeper frames never qualify.
    pub stop_level: Option<u32>,
    /// Line of the frame current when the request was issued.
    pub reference_line: Option<(SmolStr, u32)>,
    /// Report the eventual stop as a finish (step-out) stop.
    pub stop_on_finish: bool,
}

impl StepRequest {
    /// Step-over: stay at or above the issuing frame's depth.
    #[must_use]
    pub fn next(frame: &Frame, settings: &DebugSettings) -> Self {
        Self {
            require_different_line: settings.different_line,
            stop_level: Some(frame.depth),
            ..Self::default()
        }
    }

    /// Step-out: run until the issuing frame returns.
    #[must_use]
    pub fn finish(frame: &Frame) -> Self {
        Self {
            event_filter: vec![EventKind::Return],
            stop_level: Some(frame.depth.saturating_sub(1)),
            stop_on_finish: true,
            ..Self::default()
        }
    }
}

/// Result of consulting the controller for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The event does not qualify, or no request is installed.
    NoMatch,
    /// The event qualified and was consumed by the ignore count.
    Counted,
    /// Stop now.
    Stop {
        /// The satisfied request was a finish request.
        finish: bool,
    },
}

/// Holds the active stepping policy for one traced thread.
#[derive(Debug, Default)]
pub struct StepController {
    request: Option<StepRequest>,
}

impl StepController {
    /// Create a controller with no stepping installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a request, capturing the reference line from the current
    /// frame. Replaces any previous request.
    pub fn install(&mut self, mut request: StepRequest, frame: Option<&Frame>) {
        if let Some(frame) = frame {
            request.reference_line = Some((frame.file.clone(), frame.line));
        }
        self.request = Some(request);
    }

    /// Drop the active request (continue semantics).
    pub fn clear(&mut self) {
        self.request = None;
    }

    /// Whether a request is installed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.request.is_some()
    }

    /// The installed request, if any.
    #[must_use]
    pub fn request(&self) -> Option<&StepRequest> {
        self.request.as_ref()
    }

    /// Consult the policy for one event. A `Counted` outcome persists the
    /// ignore-count decrement; `Stop` consumes the request.
    pub fn check(&mut self, event: &TraceEvent) -> StepOutcome {
        let Some(request) = self.request.as_mut() else {
            return StepOutcome::NoMatch;
        };
        if !request.event_filter.is_empty() && !request.event_filter.contains(&event.kind) {
            return StepOutcome::NoMatch;
        }
        if let Some(stop_level) = request.stop_level {
            if event.frame.depth > stop_level {
                return StepOutcome::NoMatch;
            }
        }
        if request.require_different_line {
            if let Some((file, line)) = &request.reference_line {
                if *file == event.frame.file && *line == event.frame.line {
                    return StepOutcome::NoMatch;
                }
            }
        }
        if request.ignore_count == 0 {
            let finish = request.stop_on_finish;
            self.request = None;
            StepOutcome::Stop { finish }
        } else {
            request.ignore_count -= 1;
            StepOutcome::Counted
        }
    }
}

/// Parse the step family's command token and positional arguments.
///
/// The token suffix narrows the event filter (`>` call, `<` return, `!`
/// exception) and forces the different-line requirement (`+`/`-`); with no
/// `+`/`-` suffix the settings default applies. Positional arguments are
/// event-kind names, optionally followed by one repeat count (`n` means
/// stop on the n-th qualifying event, so the ignore count is `n - 1`).
///
/// # Errors
/// `DebugError::Argument` for an unrecognized token or a malformed count;
/// the caller must leave all stepping state untouched in that case.
pub fn parse_step_args(
    token: &str,
    rest: &[&str],
    settings: &DebugSettings,
) -> Result<StepRequest, DebugError> {
    let mut request = StepRequest {
        require_different_line: settings.different_line,
        ..StepRequest::default()
    };
    let mut base = token;
    if let Some(stripped) = base.strip_suffix('+') {
        request.require_different_line = true;
        base = stripped;
    } else if let Some(stripped) = base.strip_suffix('-') {
        request.require_different_line = false;
        base = stripped;
    }
    if base.ends_with('>') {
        request.event_filter.push(EventKind::Call);
    } else if base.ends_with('<') {
        request.event_filter.push(EventKind::Return);
    } else if base.ends_with('!') {
        request.event_filter.push(EventKind::Exception);
    }

    let mut pos = 0;
    while pos < rest.len() {
        let Some(kind) = EventKind::parse(rest[pos]) else {
            break;
        };
        if !request.event_filter.contains(&kind) {
            request.event_filter.push(kind);
        }
        pos += 1;
    }
    if pos + 1 == rest.len() {
        let count: u32 = rest[pos].parse().map_err(|_| {
            DebugError::Argument(SmolStr::new(format!(
                "step count expects a positive integer, got '{}'",
                rest[pos]
            )))
        })?;
        if count == 0 {
            return Err(DebugError::Argument(SmolStr::new(
                "step count expects a positive integer, got '0'",
            )));
        }
        // The triggering event itself counts as step 1.
        request.ignore_count = count - 1;
    } else if pos != rest.len() {
        return Err(DebugError::Argument(SmolStr::new(format!(
            "invalid additional parameters {}",
            rest[pos..].join(" ")
        ))));
    }
    Ok(request)
}
