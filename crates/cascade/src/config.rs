//! Tree configuration.

use std::env;

/// Environment flag that enables registration-trace capture.
///
/// Set to `1` or `true` to make [`crate::DisposalTree`] instances built with
/// [`TreeConfig::from_env`] capture a call-stack snapshot for every first
/// registration.
pub const REGISTRATION_TRACES_ENV: &str = "CASCADE_REGISTRATION_TRACES";

/// Configuration of a [`crate::DisposalTree`].
#[derive(Debug, Clone, Default)]
pub struct TreeConfig {
    /// Capture a call-stack snapshot at the first registration of every
    /// resource and keep it for the node's lifetime. Leak diagnostics attach
    /// the snapshot to their reports. Capturing is costly, so this is off by
    /// default and intended for debug runs and test suites.
    pub capture_registration_traces: bool,
}

impl TreeConfig {
    /// Configuration with every diagnostic turned off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the configuration from the process environment.
    ///
    /// Honors [`REGISTRATION_TRACES_ENV`].
    pub fn from_env() -> Self {
        let capture = env::var(REGISTRATION_TRACES_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self {
            capture_registration_traces: capture,
        }
    }

    /// Builder-style toggle for registration-trace capture.
    #[must_use]
    pub fn capture_registration_traces(mut self, capture: bool) -> Self {
        self.capture_registration_traces = capture;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_is_off_by_default() {
        assert!(!TreeConfig::default().capture_registration_traces);
        assert!(!TreeConfig::new().capture_registration_traces);
    }

    #[test]
    fn test_builder_toggle() {
        let config = TreeConfig::new().capture_registration_traces(true);
        assert!(config.capture_registration_traces);
    }
}
