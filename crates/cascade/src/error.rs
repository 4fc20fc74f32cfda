//! Error taxonomy of the disposal engine.
//!
//! Three kinds of failure exist and they are deliberately kept apart:
//!
//! - Ordinary teardown failures ([`ActionError::Failed`]) are recovered
//!   locally: logged, traversal continues, the caller of
//!   [`crate::DisposalTree::execute_all`] never sees them.
//! - The cancellation signal ([`Canceled`]) is the sole propagating failure.
//!   It aborts the remainder of the current `execute_all` call while every
//!   already-entered guard frame still releases.
//! - Leak-diagnostic failures ([`LeakError`], [`RetainedResourceError`]) are
//!   returned to the asserting caller, carrying the captured registration
//!   traces when available.

use std::fmt;

use crate::trace::AllocationTrace;

/// The designated cancellation signal.
///
/// Returning `ActionError::Canceled` from a teardown action unwinds the
/// remaining traversal of the current [`crate::DisposalTree::execute_all`]
/// invocation. Already-completed child teardowns are not rolled back;
/// teardown is not transactional.
#[derive(Debug, Clone, thiserror::Error)]
#[error("teardown canceled: {reason}")]
pub struct Canceled {
    reason: String,
}

impl Canceled {
    /// New cancellation signal with a human-readable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The reason given at construction.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Failure returned by a [`crate::TeardownAction`] hook.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Ordinary failure. Logged by the traversal, which then continues;
    /// never surfaced to the `execute_all` caller.
    #[error("teardown action failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Cancellation. Aborts the remainder of the enclosing `execute_all`
    /// call.
    #[error(transparent)]
    Canceled(#[from] Canceled),
}

impl ActionError {
    /// Ordinary failure wrapping any error value.
    pub fn failed<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Failed(Box::new(source))
    }

    /// Ordinary failure from a plain message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Failed(message.into().into())
    }
}

/// One root still present in the tree when it was asserted empty.
#[derive(Debug, Clone)]
pub struct LeakedRoot {
    /// Creation-order stamp of the leaked root.
    pub stamp: u64,
    /// Call stack of the registration site, when capture was configured.
    pub registration_trace: Option<AllocationTrace>,
}

/// Hard failure of [`crate::DisposalTree::assert_is_empty`]: resources were
/// registered but never torn down.
#[derive(Debug)]
pub struct LeakError {
    /// Leaked roots in creation order.
    pub leaks: Vec<LeakedRoot>,
}

impl fmt::Display for LeakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} root resource(s) were never torn down", self.leaks.len())?;
        for leak in &self.leaks {
            match &leak.registration_trace {
                Some(trace) => {
                    writeln!(f, "- root (stamp {}) registered at:\n{trace}", leak.stamp)?;
                }
                None => {
                    writeln!(f, "- root (stamp {}), registration traces disabled", leak.stamp)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for LeakError {}

/// Hard failure of
/// [`crate::DisposalTree::assert_no_reference_kept_in_tree`]: the tree still
/// holds a node for the resource.
#[derive(Debug)]
pub struct RetainedResourceError {
    /// True when the retaining node is a root object; false when it still
    /// hangs under a parent.
    pub is_root: bool,
    /// Call stack of the registration site, when capture was configured.
    pub registration_trace: Option<AllocationTrace>,
}

impl fmt::Display for RetainedResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let place = if self.is_root {
            "as a root object"
        } else {
            "under a parent"
        };
        write!(f, "resource is still referenced by the tree {place}")?;
        if let Some(trace) = &self.registration_trace {
            write!(f, ", registered at:\n{trace}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RetainedResourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canceled_display() {
        let canceled = Canceled::new("shutdown requested");
        assert_eq!(canceled.to_string(), "teardown canceled: shutdown requested");
        assert_eq!(canceled.reason(), "shutdown requested");
    }

    #[test]
    fn test_action_error_from_canceled() {
        let err: ActionError = Canceled::new("stop").into();
        assert!(matches!(err, ActionError::Canceled(_)));
        assert_eq!(err.to_string(), "teardown canceled: stop");
    }

    #[test]
    fn test_action_error_message() {
        let err = ActionError::message("socket already closed");
        assert_eq!(err.to_string(), "teardown action failed: socket already closed");
    }

    #[test]
    fn test_leak_error_lists_every_root() {
        let err = LeakError {
            leaks: vec![
                LeakedRoot {
                    stamp: 1,
                    registration_trace: None,
                },
                LeakedRoot {
                    stamp: 4,
                    registration_trace: None,
                },
            ],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("2 root resource(s)"));
        assert!(rendered.contains("stamp 1"));
        assert!(rendered.contains("stamp 4"));
    }
}
