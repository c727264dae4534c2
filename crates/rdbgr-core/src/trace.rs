//! Dispatch decision tracing, gated on the `RDBGR_DEBUG_TRACE` env var.

#![allow(missing_docs)]

use std::sync::OnceLock;

use crate::types::{Frame, StopReason};

fn enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var_os("RDBGR_DEBUG_TRACE").is_some())
}

pub(crate) fn trace_debug(message: &str) {
    if enabled() {
        eprintln!("[rdbgr-core][debug] {message}");
    }
}

pub(crate) fn trace_stop(reason: StopReason, frame: &Frame) {
    if enabled() {
        eprintln!(
            "[rdbgr-core][debug] stop reason={reason:?} at {}:{} in {} thread={:?}",
            frame.file, frame.line, frame.function, frame.thread
        );
    }
}
