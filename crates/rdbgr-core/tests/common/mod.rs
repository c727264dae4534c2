//! Shared helpers for building synthetic trace event streams.

use rdbgr_core::{ActivationId, EventKind, Frame, ThreadId, TraceEvent};

pub fn frame(
    thread: u32,
    function: &str,
    file: &str,
    line: u32,
    depth: u32,
    activation: u64,
) -> Frame {
    Frame {
        function: function.into(),
        file: file.into(),
        line,
        depth,
        activation: ActivationId(activation),
        thread: ThreadId(thread),
    }
}

pub fn event(
    kind: EventKind,
    thread: u32,
    function: &str,
    file: &str,
    line: u32,
    depth: u32,
    activation: u64,
) -> TraceEvent {
    TraceEvent {
        kind,
        frame: frame(thread, function, file, line, depth, activation),
    }
}

/// Events for a single-threaded program where `main` calls `add` once.
pub fn call_program() -> Vec<TraceEvent> {
    vec![
        event(EventKind::Call, 1, "main", "main.rs", 1, 0, 1),
        event(EventKind::Line, 1, "main", "main.rs", 5, 0, 1),
        event(EventKind::Call, 1, "add", "lib.rs", 1, 1, 2),
        event(EventKind::Line, 1, "add", "lib.rs", 2, 1, 2),
        event(EventKind::Return, 1, "add", "lib.rs", 3, 1, 2),
        event(EventKind::Line, 1, "main", "main.rs", 6, 0, 1),
        event(EventKind::Return, 1, "main", "main.rs", 7, 0, 1),
    ]
}
