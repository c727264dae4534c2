//! Trace event and frame types.

#![allow(missing_docs)]

use smol_str::SmolStr;

/// Kind of a trace event delivered by the execution host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A function is being entered.
    Call,
    /// Execution reached a new source line.
    Line,
    /// A function is about to return.
    Return,
    /// An exception is propagating.
    Exception,
    /// A native (non-traced) function is being entered.
    CCall,
    /// A native function is about to return.
    CReturn,
    /// An exception is propagating out of a native function.
    CException,
}

impl EventKind {
    /// All event kinds, in the order the host reports them.
    pub const ALL: [EventKind; 7] = [
        EventKind::Call,
        EventKind::Line,
        EventKind::Return,
        EventKind::Exception,
        EventKind::CCall,
        EventKind::CReturn,
        EventKind::CException,
    ];

    /// Parse a user-facing event name.
    #[must_use]
    pub fn parse(name: &str) -> Option<EventKind> {
        match name {
            "call" => Some(EventKind::Call),
            "line" => Some(EventKind::Line),
            "return" => Some(EventKind::Return),
            "exception" => Some(EventKind::Exception),
            "c-call" => Some(EventKind::CCall),
            "c-return" => Some(EventKind::CReturn),
            "c-exception" => Some(EventKind::CException),
            _ => None,
        }
    }

    /// The user-facing name for this event kind.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Call => "call",
            EventKind::Line => "line",
            EventKind::Return => "return",
            EventKind::Exception => "exception",
            EventKind::CCall => "c-call",
            EventKind::CReturn => "c-return",
            EventKind::CException => "c-exception",
        }
    }
}

/// Identifier of one traced execution thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub u32);

/// Unique token per function-call instance.
///
/// Assigned by the host from a monotonic counter on every call event, so
/// recursive re-entries of the same function are distinguishable from
/// continued execution of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivationId(pub u64);

/// One function activation as seen by the tracer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Identity of the executing function.
    pub function: SmolStr,
    /// Source file of the current line.
    pub file: SmolStr,
    /// Current source line.
    pub line: u32,
    /// Stack depth of this activation (outermost frame is 0).
    pub depth: u32,
    /// Activation token for this call instance.
    pub activation: ActivationId,
    /// Thread executing this activation.
    pub thread: ThreadId,
}

/// Notification from the execution host, carrying the active frame.
#[derive(Debug, Clone)]
pub struct TraceEvent {
    /// What happened.
    pub kind: EventKind,
    /// Where it happened.
    pub frame: Frame,
}

/// Why execution was suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A breakpoint fired; carries its id.
    Breakpoint(u32),
    /// An installed step request was satisfied.
    Step,
    /// A finish (step-out) request was satisfied.
    Finish,
    /// A user pause request was honored.
    Pause,
}

/// Notification emitted when execution stops.
#[derive(Debug, Clone)]
pub struct DebugStop {
    /// Reason for stopping.
    pub reason: StopReason,
    /// Function stopped in.
    pub function: SmolStr,
    /// File of the stop location.
    pub file: SmolStr,
    /// Line of the stop location.
    pub line: u32,
    /// Thread that triggered the stop.
    pub thread: ThreadId,
}
