//! The two-phase teardown visitor.

use std::sync::Arc;

use crate::error::ActionError;

/// Two-phase visitor applied during a disposal traversal.
///
/// [`before_tree_execution`](TeardownAction::before_tree_execution) runs
/// pre-order on the way down; [`execute`](TeardownAction::execute) runs
/// post-order, children before self, and is the actual teardown. The visitor
/// is supplied per [`crate::DisposalTree::execute_all`] call by the code
/// that owns the resources; the tree itself never knows how a resource is
/// torn down.
pub trait TeardownAction<R: ?Sized>: Send + Sync {
    /// Pre-order hook, called before this resource's subtree executes.
    ///
    /// Failures are logged and never abort the traversal, cancellation
    /// included.
    fn before_tree_execution(&self, resource: &Arc<R>) -> Result<(), ActionError> {
        let _ = resource;
        Ok(())
    }

    /// Post-order teardown of one resource.
    ///
    /// Ordinary failures are logged and the traversal continues. Returning
    /// [`ActionError::Canceled`] aborts the remainder of the enclosing
    /// `execute_all` call.
    fn execute(&self, resource: &Arc<R>) -> Result<(), ActionError>;
}

/// Adapter turning a closure into a [`TeardownAction`].
///
/// The closure becomes the post-order teardown; the pre-order hook stays a
/// no-op.
pub struct FnAction<F> {
    teardown: F,
}

impl<F> FnAction<F> {
    /// Wrap `teardown` as the post-order hook.
    pub fn new(teardown: F) -> Self {
        Self { teardown }
    }
}

impl<R, F> TeardownAction<R> for FnAction<F>
where
    R: ?Sized,
    F: Fn(&Arc<R>) -> Result<(), ActionError> + Send + Sync,
{
    fn execute(&self, resource: &Arc<R>) -> Result<(), ActionError> {
        (self.teardown)(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_fn_action_invokes_closure() {
        let calls = AtomicUsize::new(0);
        let action = FnAction::new(|_: &Arc<u32>| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ActionError>(())
        });

        let resource = Arc::new(9_u32);
        action.before_tree_execution(&resource).unwrap();
        action.execute(&resource).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
