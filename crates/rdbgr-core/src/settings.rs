//! Debugger settings snapshot.

/// Settings consulted by the execution-control core.
///
/// The interactive settings store lives outside the core; commands pass a
/// snapshot of the values the core cares about.
#[derive(Debug, Clone)]
pub struct DebugSettings {
    /// Default for the step family's different-line requirement, used when
    /// the command token carries no `+`/`-` suffix.
    pub different_line: bool,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            different_line: true,
        }
    }
}
