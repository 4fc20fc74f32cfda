//! Register/execute notification hooks.

use std::sync::Arc;

/// Observer of tree lifecycle events.
///
/// Listeners are invoked synchronously on the thread performing the
/// operation, after the structural lock has been released. Both hooks
/// default to no-ops so implementations only override what they need.
pub trait TreeListener<R: ?Sized>: Send + Sync {
    /// A resource was attached to a parent, either newly registered or
    /// re-parented. Fired exactly once per successful
    /// [`crate::DisposalTree::register`] call.
    fn object_registered(&self, resource: &Arc<R>) {
        let _ = resource;
    }

    /// A resource's teardown action ran. Frames skipped by the recursive
    /// guard never fire this, so it is delivered exactly once per executed
    /// node.
    fn object_executed(&self, resource: &Arc<R>) {
        let _ = resource;
    }
}
