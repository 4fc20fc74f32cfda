//! Identity keys for tracked resources.

use std::fmt;
use std::sync::Arc;

/// Identity of a tracked resource.
///
/// The registry is keyed by reference identity of the `Arc` allocation,
/// never by `Eq`/`Hash` of the wrapped value: user-defined equality may be
/// unreliable or expensive, and two distinct resources must never collapse
/// into one node because they compare equal.
///
/// A key is only meaningful while some `Arc` for the allocation is alive.
/// The tree holds a strong reference for every tracked resource, so a
/// tracked key can never alias a recycled allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(usize);

impl ResourceKey {
    /// Key of the given resource handle.
    pub fn of<R: ?Sized>(resource: &Arc<R>) -> Self {
        // Thin data pointer of the allocation; metadata of fat pointers
        // (trait objects, slices) is discarded on purpose.
        Self(Arc::as_ptr(resource).cast::<()>() as usize)
    }

    /// The underlying address value.
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}
