//! Call-stack capture for leak diagnostics.

use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;

/// A call-stack snapshot taken when a resource was first registered.
///
/// Only captured when [`crate::TreeConfig::capture_registration_traces`] is
/// set; kept for the node's lifetime and surfaced by the leak diagnostics so
/// a leaked resource can be traced back to the code that registered it.
#[derive(Debug, Clone)]
pub struct AllocationTrace {
    // Shared so error reports can carry the trace without re-resolving it.
    backtrace: Arc<Backtrace>,
}

impl AllocationTrace {
    /// Capture the current call stack, regardless of environment settings.
    pub fn capture() -> Self {
        Self {
            backtrace: Arc::new(Backtrace::force_capture()),
        }
    }
}

impl fmt::Display for AllocationTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.backtrace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_renders_frames() {
        let trace = AllocationTrace::capture();
        // Frame symbolication depends on the build, but rendering must
        // always produce something.
        assert!(!trace.to_string().is_empty());
    }
}
